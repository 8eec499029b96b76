//! Lazily connected access to the key-value store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redigate_core::StoreProperties;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::backend::{KvBackend, RedisBackend};
use crate::error::KvError;

/// Opens a backend for the given properties
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, properties: &StoreProperties) -> Result<Arc<dyn KvBackend>, KvError>;
}

/// Connects to Redis through a `ConnectionManager`
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisConnector;

#[async_trait]
impl Connector for RedisConnector {
    async fn connect(&self, properties: &StoreProperties) -> Result<Arc<dyn KvBackend>, KvError> {
        info!("Connecting to Redis at {}", properties.redacted_url());

        let client = redis::Client::open(properties.connection_url())
            .map_err(|e| KvError::ConnectionFailed(e.to_string()))?;

        let settings = &properties.connection;
        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(settings.connect_timeout())
            .set_response_timeout(settings.response_timeout())
            .set_number_of_retries(settings.retries)
            .set_max_delay(settings.max_retry_delay_ms);

        let manager = ConnectionManager::new_with_config(client, config)
            .await
            .map_err(|e| KvError::ConnectionFailed(e.to_string()))?;

        info!("Connected to Redis at {}", properties.redacted_url());
        Ok(Arc::new(RedisBackend::new(manager)))
    }
}

/// Snapshot of the provider's availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    pub enabled: bool,
    pub debugging: bool,
    pub connected: bool,
}

/// Owns the store properties and the memoized backend handle.
///
/// The handle is created on first use. Concurrent first callers serialize on
/// the write lock and only one of them connects; later callers take the read
/// lock only. Callers that queued behind a failed attempt share its error
/// instead of connecting again. The next fresh call retries.
pub struct KvProvider {
    properties: StoreProperties,
    connector: Arc<dyn Connector>,
    slot: RwLock<Slot>,
    attempts: AtomicU64,
}

#[derive(Default)]
struct Slot {
    backend: Option<Arc<dyn KvBackend>>,
    last_error: Option<String>,
}

impl KvProvider {
    pub fn new(properties: StoreProperties, connector: Arc<dyn Connector>) -> Self {
        Self {
            properties,
            connector,
            slot: RwLock::new(Slot::default()),
            attempts: AtomicU64::new(0),
        }
    }

    /// Provider connecting to Redis
    pub fn redis(properties: StoreProperties) -> Self {
        Self::new(properties, Arc::new(RedisConnector))
    }

    pub fn properties(&self) -> &StoreProperties {
        &self.properties
    }

    pub fn is_enabled(&self) -> bool {
        self.properties.enabled
    }

    pub fn is_debugging(&self) -> bool {
        self.properties.debugging
    }

    /// The memoized backend, connecting on first use
    pub async fn backend(&self) -> Result<Arc<dyn KvBackend>, KvError> {
        if !self.is_enabled() {
            return Err(KvError::Disabled);
        }

        // Only changes under the write lock
        let observed = self.attempts.load(Ordering::SeqCst);

        if let Some(backend) = self.slot.read().await.backend.as_ref() {
            return Ok(backend.clone());
        }

        let mut slot = self.slot.write().await;
        if let Some(backend) = slot.backend.as_ref() {
            return Ok(backend.clone());
        }
        if self.attempts.load(Ordering::SeqCst) != observed {
            let cause = slot.last_error.clone().unwrap_or_default();
            debug!("Sharing the failed connection attempt: {}", cause);
            return Err(KvError::ConnectionFailed(cause));
        }

        let result = self.connector.connect(&self.properties).await;
        self.attempts.fetch_add(1, Ordering::SeqCst);

        match result {
            Ok(backend) => {
                slot.backend = Some(backend.clone());
                slot.last_error = None;
                Ok(backend)
            }
            Err(e) => {
                let cause = match e {
                    KvError::ConnectionFailed(cause) => cause,
                    other => other.to_string(),
                };
                slot.last_error = Some(cause.clone());
                Err(KvError::ConnectionFailed(cause))
            }
        }
    }

    /// Like [`backend`](Self::backend), with the failure logged and dropped
    pub async fn handle(&self) -> Option<Arc<dyn KvBackend>> {
        match self.backend().await {
            Ok(backend) => Some(backend),
            Err(KvError::Disabled) => {
                debug!("Key-value store is disabled");
                None
            }
            Err(e) => {
                warn!("Key-value store unavailable: {}", e);
                None
            }
        }
    }

    /// Whether the store answers PING with a non-empty reply
    pub async fn is_connected(&self) -> bool {
        let Some(backend) = self.handle().await else {
            return false;
        };

        match backend.ping().await {
            Ok(reply) => !reply.is_empty(),
            Err(e) => {
                warn!("Key-value store ping failed: {}", e);
                false
            }
        }
    }

    pub async fn can_execute(&self) -> bool {
        self.is_enabled() && self.is_connected().await
    }

    pub async fn status(&self) -> StoreStatus {
        StoreStatus {
            enabled: self.is_enabled(),
            debugging: self.is_debugging(),
            connected: self.is_connected().await,
        }
    }
}
