//! Lookup of shared service handles by type or by name.
//!
//! Handles are stored as `Arc<T>` behind `dyn Any`, so a lookup with the wrong
//! type simply misses instead of failing.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::RegistryError;

struct NamedService {
    type_name: &'static str,
    service: Box<dyn Any + Send + Sync>,
}

/// Registry of services shared across the process
pub struct ServiceRegistry {
    services: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
    named: Mutex<HashMap<String, NamedService>>,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            services: Mutex::new(HashMap::new()),
            named: Mutex::new(HashMap::new()),
        }
    }

    /// Register a service under its type, replacing any previous one
    pub fn register<T: Send + Sync + 'static + ?Sized>(&self, service: Arc<T>) {
        debug!("Registering service: {}", std::any::type_name::<T>());
        lock(&self.services).insert(TypeId::of::<T>(), Box::new(service));
    }

    /// Get a service if it's registered
    pub fn get<T: Send + Sync + 'static + ?Sized>(&self) -> Option<Arc<T>> {
        lock(&self.services)
            .get(&TypeId::of::<T>())
            .and_then(|any| any.downcast_ref::<Arc<T>>())
            .cloned()
    }

    /// Like [`get`](Self::get), but reports which type was missing
    pub fn require<T: Send + Sync + 'static + ?Sized>(&self) -> Result<Arc<T>, RegistryError> {
        self.get::<T>()
            .ok_or_else(|| RegistryError::NotRegistered(std::any::type_name::<T>().to_string()))
    }

    /// Register a service under a name, replacing any previous one
    pub fn register_named<T: Send + Sync + 'static + ?Sized>(&self, name: &str, service: Arc<T>) {
        debug!(
            "Registering service '{}': {}",
            name,
            std::any::type_name::<T>()
        );
        lock(&self.named).insert(
            name.to_string(),
            NamedService {
                type_name: std::any::type_name::<T>(),
                service: Box::new(service),
            },
        );
    }

    /// Get a named service; `None` when missing or registered with another type
    pub fn get_named<T: Send + Sync + 'static + ?Sized>(&self, name: &str) -> Option<Arc<T>> {
        lock(&self.named)
            .get(name)
            .and_then(|entry| entry.service.downcast_ref::<Arc<T>>())
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        lock(&self.named).contains_key(name)
    }

    /// Type name of the service registered under `name`
    pub fn type_name_of(&self, name: &str) -> Option<&'static str> {
        lock(&self.named).get(name).map(|entry| entry.type_name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.named).keys().cloned().collect();
        names.sort();
        names
    }
}

// A panic while holding the lock cannot leave a HashMap insert half-done.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
