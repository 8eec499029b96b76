//! Wiring of provider, facade and gate.

use std::sync::Arc;

use redigate_core::{ConfigError, ServiceRegistry, StoreProperties};
use tracing::info;

use crate::gate::KvGate;
use crate::provider::{Connector, KvProvider, RedisConnector};
use crate::services::KvService;

pub const PROVIDER_NAME: &str = "kvProvider";
pub const SERVICE_NAME: &str = "kvService";
pub const GATE_NAME: &str = "kvGate";

/// The three store handles, built once at startup and shared from there.
///
/// Nothing connects here; the provider opens its backend on first use.
#[derive(Clone)]
pub struct Redigate {
    provider: Arc<KvProvider>,
    service: Arc<KvService>,
    gate: Arc<KvGate>,
}

impl Redigate {
    /// Handles for a Redis store
    pub fn connect(properties: StoreProperties) -> Result<Self, ConfigError> {
        Self::with_connector(properties, Arc::new(RedisConnector))
    }

    pub fn with_connector(
        properties: StoreProperties,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ConfigError> {
        properties.validate()?;
        info!("Key-value store configured: {}", properties);

        let provider = Arc::new(KvProvider::new(properties, connector));
        let service = Arc::new(KvService::new(provider.clone()));
        let gate = Arc::new(KvGate::new(provider.clone(), service.clone()));

        Ok(Self {
            provider,
            service,
            gate,
        })
    }

    pub fn provider(&self) -> Arc<KvProvider> {
        self.provider.clone()
    }

    pub fn service(&self) -> Arc<KvService> {
        self.service.clone()
    }

    pub fn gate(&self) -> Arc<KvGate> {
        self.gate.clone()
    }

    /// Publish the handles by type and under their well-known names
    pub fn register(&self, registry: &ServiceRegistry) {
        registry.register(self.provider.clone());
        registry.register(self.service.clone());
        registry.register(self.gate.clone());

        registry.register_named(PROVIDER_NAME, self.provider.clone());
        registry.register_named(SERVICE_NAME, self.service.clone());
        registry.register_named(GATE_NAME, self.gate.clone());
    }

    /// Resolve previously registered handles; `None` if any is missing
    pub fn from_registry(registry: &ServiceRegistry) -> Option<Self> {
        Some(Self {
            provider: registry.get::<KvProvider>()?,
            service: registry.get::<KvService>()?,
            gate: registry.get::<KvGate>()?,
        })
    }
}
