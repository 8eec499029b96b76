//! The command surface the facade needs from a key-value store.
//!
//! Values cross this seam already encoded; the backend never sees Rust types.
//! Keys arrive trimmed and non-empty.

mod redis;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::KvError;

pub use self::redis::RedisBackend;

/// A connected handle able to issue store commands
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn ping(&self) -> Result<String, KvError>;

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, KvError>;
    async fn exists(&self, key: &str) -> Result<bool, KvError>;
    /// Name of the key's type as reported by TYPE, `"none"` when missing
    async fn key_type(&self, key: &str) -> Result<String, KvError>;
    async fn del(&self, key: &str) -> Result<bool, KvError>;

    async fn pexpire(&self, key: &str, ttl: Duration) -> Result<bool, KvError>;
    /// Remaining time to live in milliseconds; -1 without expiry, -2 when missing
    async fn pttl(&self, key: &str) -> Result<i64, KvError>;
    async fn persist(&self, key: &str) -> Result<bool, KvError>;

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), KvError>;
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    async fn rpush(&self, key: &str, values: &[String]) -> Result<usize, KvError>;
    async fn lrange_all(&self, key: &str) -> Result<Vec<String>, KvError>;

    async fn sadd(&self, key: &str, members: &[String]) -> Result<usize, KvError>;
    async fn smembers(&self, key: &str) -> Result<Vec<String>, KvError>;

    async fn zrange_all(&self, key: &str) -> Result<Vec<(String, f64)>, KvError>;

    async fn hset(&self, key: &str, entries: &[(String, String)]) -> Result<(), KvError>;
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, KvError>;
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, KvError>;
    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>, KvError>;

    async fn publish(&self, channel: &str, message: &str) -> Result<i64, KvError>;

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, KvError>;
    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64, KvError>;
}

/// Raw contents of a key, read according to its store type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum StoredValue {
    String(String),
    List(Vec<String>),
    Hash(BTreeMap<String, String>),
    Set(BTreeSet<String>),
    /// Members with their scores, lowest score first
    ZSet(Vec<(String, f64)>),
}

impl StoredValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            StoredValue::String(_) => "string",
            StoredValue::List(_) => "list",
            StoredValue::Hash(_) => "hash",
            StoredValue::Set(_) => "set",
            StoredValue::ZSet(_) => "zset",
        }
    }
}

/// Clamp a duration to the millisecond argument PEXPIRE and SET PX accept
pub(crate) fn duration_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_value_serialization() {
        let value = StoredValue::List(vec!["\"a\"".to_string()]);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["type"], "list");
        assert_eq!(json["value"][0], "\"a\"");

        let zset = StoredValue::ZSet(vec![("m".to_string(), 1.5)]);
        assert_eq!(serde_json::to_value(&zset).unwrap()["type"], "zset");
        assert_eq!(zset.type_name(), "zset");
    }

    #[test]
    fn test_duration_millis() {
        assert_eq!(duration_millis(Duration::from_secs(2)), 2000);
        assert_eq!(duration_millis(Duration::MAX), i64::MAX);
    }
}
