//! Core types shared by the redigate crates
//!
//! Store properties, the per-operation report and the service registry.

pub mod config;
pub mod error;
pub mod registry;
pub mod report;
pub mod utils;

pub use config::{ConnectionSettings, StoreProperties};
pub use error::{ConfigError, RegistryError};
pub use registry::ServiceRegistry;
pub use report::OperationReport;
pub use utils::normalize_key;
