mod defaults;
mod kv_service;

pub use defaults::SafeDefault;
pub use kv_service::KvService;
