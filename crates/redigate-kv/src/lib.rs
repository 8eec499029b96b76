//! redigate-kv: gated access to a Redis key-value store
//!
//! [`KvProvider`] owns the lazily created connection, [`KvService`] exposes one
//! method per store primitive, and [`KvGate`] runs those methods only while the
//! store is enabled and reachable, returning a [`Reported`] value.

pub mod backend;
pub mod error;
pub mod gate;
pub mod provider;
pub mod redigate;
pub mod report;
pub mod services;

#[cfg(test)]
mod testing;

pub use backend::{KvBackend, RedisBackend, StoredValue};
pub use error::KvError;
pub use gate::KvGate;
pub use provider::{Connector, KvProvider, RedisConnector, StoreStatus};
pub use redigate::Redigate;
pub use report::{Operation, Reported};
pub use services::{KvService, SafeDefault};
