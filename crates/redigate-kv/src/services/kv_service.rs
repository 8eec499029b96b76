//! Key-value facade over the memoized backend.
//!
//! Every operation follows the same contract:
//! - store disabled or unreachable: the safe default, no error
//! - blank key (or field/channel): the safe default, nothing sent to the store
//! - negative amounts and TTLs under one millisecond: the safe default
//! - missing keys: empty containers or `None`
//! - client failures: `Err(KvError)`
//!
//! Keys are trimmed before use. Values are stored as JSON text.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use redigate_core::normalize_key;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::SafeDefault;
use crate::backend::{duration_millis, KvBackend, StoredValue};
use crate::error::KvError;
use crate::provider::KvProvider;

pub struct KvService {
    provider: Arc<KvProvider>,
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, KvError> {
    Ok(serde_json::to_string(value)?)
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, KvError> {
    Ok(serde_json::from_str(raw)?)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// The store counts expiry in whole milliseconds, so anything shorter is zero
fn is_invalid_ttl(ttl: Duration) -> bool {
    duration_millis(ttl) <= 0
}

impl KvService {
    pub fn new(provider: Arc<KvProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<KvProvider> {
        &self.provider
    }

    /// Backend and trimmed key, or `None` when the call must not reach the store
    async fn target<'k>(&self, key: &'k str) -> Option<(Arc<dyn KvBackend>, &'k str)> {
        let key = normalize_key(key)?;
        let backend = self.provider.handle().await?;
        Some((backend, key))
    }

    fn log_write(&self, command: &str, key: &str, detail: &str) {
        if self.provider.is_debugging() {
            info!("KV {} {} {}", command, key, detail);
        } else {
            debug!("KV {} {}", command, key);
        }
    }

    // Keys

    /// Keys matching a glob-style pattern
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        let Some((backend, pattern)) = self.target(pattern).await else {
            return Ok(SafeDefault::safe_default());
        };
        debug!("KV KEYS {}", pattern);
        backend.keys(pattern).await
    }

    /// Every key in the selected database
    pub async fn default_keys(&self) -> Result<Vec<String>, KvError> {
        self.keys("*").await
    }

    pub async fn contains_key(&self, key: &str) -> Result<bool, KvError> {
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        debug!("KV EXISTS {}", key);
        backend.exists(key).await
    }

    /// Set a key's time to live. Returns true when the key exists and the timeout was set.
    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, KvError> {
        if is_invalid_ttl(ttl) {
            return Ok(SafeDefault::safe_default());
        }
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        self.log_write("PEXPIRE", key, &format!("{}ms", ttl.as_millis()));
        backend.pexpire(key, ttl).await
    }

    /// Remaining time to live; `None` when the key is missing or never expires
    pub async fn ttl(&self, key: &str) -> Result<Option<Duration>, KvError> {
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        debug!("KV PTTL {}", key);
        let millis = backend.pttl(key).await?;
        Ok(u64::try_from(millis).ok().map(Duration::from_millis))
    }

    /// Remove a key's expiry. Returns true when an expiry was removed.
    pub async fn persist(&self, key: &str) -> Result<bool, KvError> {
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        self.log_write("PERSIST", key, "");
        backend.persist(key).await
    }

    pub async fn remove_object(&self, key: &str) -> Result<bool, KvError> {
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        self.log_write("DEL", key, "");
        backend.del(key).await
    }

    // Scalar values

    pub async fn set_cache_object<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), KvError> {
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        let encoded = encode(value)?;
        self.log_write("SET", key, &encoded);
        backend.set(key, &encoded, None).await
    }

    /// Set a value that expires after `ttl`, in a single command
    pub async fn set_cache_object_ex<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), KvError> {
        if is_invalid_ttl(ttl) {
            return Ok(SafeDefault::safe_default());
        }
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        let encoded = encode(value)?;
        self.log_write("SET", key, &format!("{} PX {}", encoded, ttl.as_millis()));
        backend.set(key, &encoded, Some(ttl)).await
    }

    pub async fn get_cache_object<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, KvError> {
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        debug!("KV GET {}", key);
        backend
            .get(key)
            .await?
            .map(|raw| decode(&raw))
            .transpose()
    }

    // Lists

    /// Append every item to the list. Returns the list length after the push.
    pub async fn set_cache_list<I>(&self, key: &str, items: I) -> Result<usize, KvError>
    where
        I: IntoIterator,
        I::Item: Serialize,
    {
        if normalize_key(key).is_none() {
            return Ok(SafeDefault::safe_default());
        }
        let encoded = items
            .into_iter()
            .map(|item| encode(&item))
            .collect::<Result<Vec<_>, _>>()?;
        if encoded.is_empty() {
            return Ok(SafeDefault::safe_default());
        }
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        self.log_write("RPUSH", key, &encoded.join(" "));
        backend.rpush(key, &encoded).await
    }

    pub async fn get_cache_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, KvError> {
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        debug!("KV LRANGE {}", key);
        backend
            .lrange_all(key)
            .await?
            .iter()
            .map(|raw| decode(raw))
            .collect()
    }

    // Sets

    /// Add members to the set. Returns how many were not already present.
    pub async fn set_cache_set<I>(&self, key: &str, items: I) -> Result<usize, KvError>
    where
        I: IntoIterator,
        I::Item: Serialize,
    {
        if normalize_key(key).is_none() {
            return Ok(SafeDefault::safe_default());
        }
        let encoded = items
            .into_iter()
            .map(|item| encode(&item))
            .collect::<Result<Vec<_>, _>>()?;
        if encoded.is_empty() {
            return Ok(SafeDefault::safe_default());
        }
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        self.log_write("SADD", key, &encoded.join(" "));
        backend.sadd(key, &encoded).await
    }

    pub async fn get_cache_set<T>(&self, key: &str) -> Result<HashSet<T>, KvError>
    where
        T: DeserializeOwned + Eq + Hash,
    {
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        debug!("KV SMEMBERS {}", key);
        backend
            .smembers(key)
            .await?
            .iter()
            .map(|raw| decode(raw))
            .collect()
    }

    // Hashes

    /// Write several hash fields at once. Blank field names are skipped.
    pub async fn set_cache_map<I, F, V>(&self, key: &str, entries: I) -> Result<(), KvError>
    where
        I: IntoIterator<Item = (F, V)>,
        F: AsRef<str>,
        V: Serialize,
    {
        if normalize_key(key).is_none() {
            return Ok(SafeDefault::safe_default());
        }
        let mut encoded = Vec::new();
        for (field, value) in entries {
            let field = field.as_ref();
            if is_blank(field) {
                continue;
            }
            encoded.push((field.to_string(), encode(&value)?));
        }
        if encoded.is_empty() {
            return Ok(SafeDefault::safe_default());
        }
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        if self.provider.is_debugging() {
            let fields: Vec<&str> = encoded.iter().map(|(f, _)| f.as_str()).collect();
            info!("KV HSET {} {:?}", key, fields);
        } else {
            debug!("KV HSET {}", key);
        }
        backend.hset(key, &encoded).await
    }

    pub async fn get_cache_map<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<HashMap<String, T>, KvError> {
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        debug!("KV HGETALL {}", key);
        backend
            .hgetall(key)
            .await?
            .into_iter()
            .map(|(field, raw)| Ok::<_, KvError>((field, decode(&raw)?)))
            .collect()
    }

    pub async fn set_cache_map_value<T: Serialize + ?Sized>(
        &self,
        key: &str,
        field: &str,
        value: &T,
    ) -> Result<(), KvError> {
        if is_blank(field) {
            return Ok(SafeDefault::safe_default());
        }
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        let encoded = encode(value)?;
        self.log_write("HSET", key, &format!("{} {}", field, encoded));
        backend
            .hset(key, &[(field.to_string(), encoded)])
            .await
    }

    pub async fn get_cache_map_value<T: DeserializeOwned>(
        &self,
        key: &str,
        field: &str,
    ) -> Result<Option<T>, KvError> {
        if is_blank(field) {
            return Ok(SafeDefault::safe_default());
        }
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        debug!("KV HGET {} {}", key, field);
        backend
            .hget(key, field)
            .await?
            .map(|raw| decode(&raw))
            .transpose()
    }

    /// Values of several hash fields, in the order requested
    pub async fn get_multi_cache_map_value<T, F>(
        &self,
        key: &str,
        fields: &[F],
    ) -> Result<Vec<Option<T>>, KvError>
    where
        T: DeserializeOwned,
        F: AsRef<str>,
    {
        if fields.is_empty() {
            return Ok(SafeDefault::safe_default());
        }
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        let fields: Vec<String> = fields.iter().map(|f| f.as_ref().to_string()).collect();
        debug!("KV HMGET {} {:?}", key, fields);
        backend
            .hmget(key, &fields)
            .await?
            .into_iter()
            .map(|raw| raw.map(|raw| decode(&raw)).transpose())
            .collect()
    }

    // Pub/sub

    /// Publish a message. Returns the number of subscribers that received it.
    pub async fn produce<T: Serialize + ?Sized>(
        &self,
        channel: &str,
        message: &T,
    ) -> Result<i64, KvError> {
        let Some((backend, channel)) = self.target(channel).await else {
            return Ok(SafeDefault::safe_default());
        };
        let encoded = encode(message)?;
        self.log_write("PUBLISH", channel, &encoded);
        backend.publish(channel, &encoded).await
    }

    // Counters

    pub async fn increase_key(&self, key: &str) -> Result<i64, KvError> {
        self.increase_key_by(key, 1).await
    }

    pub async fn decrease_key(&self, key: &str) -> Result<i64, KvError> {
        self.decrease_key_by(key, 1).await
    }

    /// Atomically add `amount` (which must not be negative) and return the new value
    pub async fn increase_key_by(&self, key: &str, amount: i64) -> Result<i64, KvError> {
        if amount < 0 {
            return Ok(SafeDefault::safe_default());
        }
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        self.log_write("INCRBY", key, &amount.to_string());
        backend.incr_by(key, amount).await
    }

    /// Atomically subtract `amount` (which must not be negative) and return the new value
    pub async fn decrease_key_by(&self, key: &str, amount: i64) -> Result<i64, KvError> {
        if amount < 0 {
            return Ok(SafeDefault::safe_default());
        }
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        self.log_write("DECRBY", key, &amount.to_string());
        backend.decr_by(key, amount).await
    }

    pub async fn increase_key_ex(&self, key: &str, ttl: Duration) -> Result<i64, KvError> {
        self.increase_key_by_ex(key, 1, ttl).await
    }

    pub async fn decrease_key_ex(&self, key: &str, ttl: Duration) -> Result<i64, KvError> {
        self.decrease_key_by_ex(key, 1, ttl).await
    }

    /// Increment, then set the key's expiry. Returns the incremented value.
    pub async fn increase_key_by_ex(
        &self,
        key: &str,
        amount: i64,
        ttl: Duration,
    ) -> Result<i64, KvError> {
        if amount < 0 || is_invalid_ttl(ttl) {
            return Ok(SafeDefault::safe_default());
        }
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        self.log_write(
            "INCRBY",
            key,
            &format!("{} PEXPIRE {}", amount, ttl.as_millis()),
        );
        let value = backend.incr_by(key, amount).await?;
        backend.pexpire(key, ttl).await?;
        Ok(value)
    }

    /// Decrement, then set the key's expiry. Returns the decremented value.
    pub async fn decrease_key_by_ex(
        &self,
        key: &str,
        amount: i64,
        ttl: Duration,
    ) -> Result<i64, KvError> {
        if amount < 0 || is_invalid_ttl(ttl) {
            return Ok(SafeDefault::safe_default());
        }
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        self.log_write(
            "DECRBY",
            key,
            &format!("{} PEXPIRE {}", amount, ttl.as_millis()),
        );
        let value = backend.decr_by(key, amount).await?;
        backend.pexpire(key, ttl).await?;
        Ok(value)
    }

    // Inspection

    /// Read a key according to its type. `None` when the key does not exist.
    pub async fn inspect(&self, key: &str) -> Result<Option<StoredValue>, KvError> {
        let Some((backend, key)) = self.target(key).await else {
            return Ok(SafeDefault::safe_default());
        };
        let kind = backend.key_type(key).await?;
        debug!("KV INSPECT {} ({})", key, kind);

        let value = match kind.as_str() {
            "none" => return Ok(None),
            "string" => match backend.get(key).await? {
                Some(value) => StoredValue::String(value),
                None => return Ok(None),
            },
            "list" => StoredValue::List(backend.lrange_all(key).await?),
            "hash" => StoredValue::Hash(backend.hgetall(key).await?.into_iter().collect()),
            "set" => StoredValue::Set(backend.smembers(key).await?.into_iter().collect()),
            "zset" => StoredValue::ZSet(backend.zrange_all(key).await?),
            other => return Err(KvError::UnsupportedType(other.to_string())),
        };
        Ok(Some(value))
    }

    /// Every key with its store type
    pub async fn key_types(&self) -> Result<BTreeMap<String, String>, KvError> {
        let Some(backend) = self.provider.handle().await else {
            return Ok(SafeDefault::safe_default());
        };
        let mut types = BTreeMap::new();
        for key in backend.keys("*").await? {
            let kind = backend.key_type(&key).await?;
            types.insert(key, kind);
        }
        Ok(types)
    }
}
