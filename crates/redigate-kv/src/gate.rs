//! Availability gate in front of the facade.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::error::KvError;
use crate::provider::KvProvider;
use crate::report::{Operation, Reported};
use crate::services::{KvService, SafeDefault};

/// Runs facade operations only while the store is enabled and reachable.
///
/// Availability is checked on every call; an outage is never remembered.
pub struct KvGate {
    provider: Arc<KvProvider>,
    service: Arc<KvService>,
}

impl KvGate {
    pub fn new(provider: Arc<KvProvider>, service: Arc<KvService>) -> Self {
        Self { provider, service }
    }

    pub async fn can_execute(&self) -> bool {
        self.provider.can_execute().await
    }

    /// Run `f` against the facade and report the outcome.
    ///
    /// When the store is unavailable `f` is not invoked and the result is the
    /// safe default with a 503 report.
    pub async fn call<T, F, Fut>(&self, operation: Operation, f: F) -> Reported<T>
    where
        T: SafeDefault,
        F: FnOnce(Arc<KvService>) -> Fut,
        Fut: Future<Output = Result<T, KvError>>,
    {
        let operation = operation.verbose(self.provider.is_debugging());

        if !self.can_execute().await {
            debug!("Skipping {}: key-value store unavailable", operation.name());
            return Reported::unavailable(&operation);
        }

        Reported::capture(&operation, f(self.service.clone()).await)
    }
}
