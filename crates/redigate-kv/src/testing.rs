//! In-memory doubles for unit tests.
//!
//! `RecordingBackend` keeps just enough store behaviour to exercise the facade
//! and logs every command it receives, so tests can assert that guarded calls
//! never reach the store.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use redigate_core::StoreProperties;

use crate::backend::{duration_millis, KvBackend};
use crate::error::KvError;
use crate::provider::Connector;

#[derive(Debug, Clone)]
enum Entry {
    Str(String),
    List(Vec<String>),
    Set(BTreeSet<String>),
    Hash(BTreeMap<String, String>),
    ZSet(Vec<(String, f64)>),
}

impl Entry {
    fn type_name(&self) -> &'static str {
        match self {
            Entry::Str(_) => "string",
            Entry::List(_) => "list",
            Entry::Set(_) => "set",
            Entry::Hash(_) => "hash",
            Entry::ZSet(_) => "zset",
        }
    }
}

#[derive(Default)]
struct State {
    entries: HashMap<String, Entry>,
    ttls: HashMap<String, i64>,
    commands: Vec<String>,
    published: Vec<(String, String)>,
    failure: Option<&'static str>,
}

#[derive(Default)]
pub(crate) struct RecordingBackend {
    state: Mutex<State>,
}

fn wrong_type() -> KvError {
    KvError::Redis(redis::RedisError::from((
        redis::ErrorKind::TypeError,
        "WRONGTYPE Operation against a key holding the wrong kind of value",
    )))
}

fn glob_matches(pattern: &str, key: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == key,
        Some((prefix, rest)) => {
            key.starts_with(prefix)
                && (0..=key.len() - prefix.len()).any(|skip| {
                    let tail = &key[prefix.len()..];
                    tail.is_char_boundary(skip) && glob_matches(rest, &tail[skip..])
                })
        }
    }
}

impl RecordingBackend {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of commands received so far
    pub(crate) fn calls(&self) -> usize {
        self.state.lock().unwrap().commands.len()
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    /// Channel and message of every PUBLISH, in order
    pub(crate) fn published(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().published.clone()
    }

    /// Make every following command fail with an I/O error
    pub(crate) fn fail_with(&self, message: &'static str) {
        self.state.lock().unwrap().failure = Some(message);
    }

    pub(crate) fn insert_zset(&self, key: &str, members: &[(&str, f64)]) {
        self.state.lock().unwrap().entries.insert(
            key.to_string(),
            Entry::ZSet(members.iter().map(|(m, s)| (m.to_string(), *s)).collect()),
        );
    }

    fn record(&self, command: &str) -> Result<std::sync::MutexGuard<'_, State>, KvError> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(command.to_string());
        if let Some(message) = state.failure {
            return Err(KvError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                message,
            ))));
        }
        Ok(state)
    }
}

#[async_trait]
impl KvBackend for RecordingBackend {
    async fn ping(&self) -> Result<String, KvError> {
        let _state = self.record("PING")?;
        Ok("PONG".to_string())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        let state = self.record("KEYS")?;
        let mut keys: Vec<String> = state
            .entries
            .keys()
            .filter(|key| glob_matches(pattern, key))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool, KvError> {
        Ok(self.record("EXISTS")?.entries.contains_key(key))
    }

    async fn key_type(&self, key: &str) -> Result<String, KvError> {
        let state = self.record("TYPE")?;
        Ok(state
            .entries
            .get(key)
            .map(Entry::type_name)
            .unwrap_or("none")
            .to_string())
    }

    async fn del(&self, key: &str) -> Result<bool, KvError> {
        let mut state = self.record("DEL")?;
        state.ttls.remove(key);
        Ok(state.entries.remove(key).is_some())
    }

    async fn pexpire(&self, key: &str, ttl: Duration) -> Result<bool, KvError> {
        let mut state = self.record("PEXPIRE")?;
        if !state.entries.contains_key(key) {
            return Ok(false);
        }
        state.ttls.insert(key.to_string(), duration_millis(ttl));
        Ok(true)
    }

    async fn pttl(&self, key: &str) -> Result<i64, KvError> {
        let state = self.record("PTTL")?;
        if !state.entries.contains_key(key) {
            return Ok(-2);
        }
        Ok(state.ttls.get(key).copied().unwrap_or(-1))
    }

    async fn persist(&self, key: &str) -> Result<bool, KvError> {
        Ok(self.record("PERSIST")?.ttls.remove(key).is_some())
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), KvError> {
        let mut state = self.record("SET")?;
        state
            .entries
            .insert(key.to_string(), Entry::Str(value.to_string()));
        match ttl {
            Some(ttl) => state.ttls.insert(key.to_string(), duration_millis(ttl)),
            None => state.ttls.remove(key),
        };
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let state = self.record("GET")?;
        match state.entries.get(key) {
            None => Ok(None),
            Some(Entry::Str(value)) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type()),
        }
    }

    async fn rpush(&self, key: &str, values: &[String]) -> Result<usize, KvError> {
        let mut state = self.record("RPUSH")?;
        let entry = state
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::List(Vec::new()));
        match entry {
            Entry::List(items) => {
                items.extend(values.iter().cloned());
                Ok(items.len())
            }
            _ => Err(wrong_type()),
        }
    }

    async fn lrange_all(&self, key: &str) -> Result<Vec<String>, KvError> {
        let state = self.record("LRANGE")?;
        match state.entries.get(key) {
            None => Ok(Vec::new()),
            Some(Entry::List(items)) => Ok(items.clone()),
            Some(_) => Err(wrong_type()),
        }
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<usize, KvError> {
        let mut state = self.record("SADD")?;
        let entry = state
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(BTreeSet::new()));
        match entry {
            Entry::Set(set) => Ok(members.iter().filter(|m| set.insert((*m).clone())).count()),
            _ => Err(wrong_type()),
        }
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, KvError> {
        let state = self.record("SMEMBERS")?;
        match state.entries.get(key) {
            None => Ok(Vec::new()),
            Some(Entry::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(wrong_type()),
        }
    }

    async fn zrange_all(&self, key: &str) -> Result<Vec<(String, f64)>, KvError> {
        let state = self.record("ZRANGE")?;
        match state.entries.get(key) {
            None => Ok(Vec::new()),
            Some(Entry::ZSet(members)) => {
                let mut members = members.clone();
                members.sort_by(|a, b| a.1.total_cmp(&b.1));
                Ok(members)
            }
            Some(_) => Err(wrong_type()),
        }
    }

    async fn hset(&self, key: &str, entries: &[(String, String)]) -> Result<(), KvError> {
        let mut state = self.record("HSET")?;
        let entry = state
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Hash(BTreeMap::new()));
        match entry {
            Entry::Hash(hash) => {
                hash.extend(entries.iter().cloned());
                Ok(())
            }
            _ => Err(wrong_type()),
        }
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, KvError> {
        let state = self.record("HGETALL")?;
        match state.entries.get(key) {
            None => Ok(HashMap::new()),
            Some(Entry::Hash(hash)) => Ok(hash.clone().into_iter().collect()),
            Some(_) => Err(wrong_type()),
        }
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, KvError> {
        let state = self.record("HGET")?;
        match state.entries.get(key) {
            None => Ok(None),
            Some(Entry::Hash(hash)) => Ok(hash.get(field).cloned()),
            Some(_) => Err(wrong_type()),
        }
    }

    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>, KvError> {
        let state = self.record("HMGET")?;
        match state.entries.get(key) {
            None => Ok(vec![None; fields.len()]),
            Some(Entry::Hash(hash)) => Ok(fields.iter().map(|f| hash.get(f).cloned()).collect()),
            Some(_) => Err(wrong_type()),
        }
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<i64, KvError> {
        let mut state = self.record("PUBLISH")?;
        state
            .published
            .push((channel.to_string(), message.to_string()));
        Ok(0)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, KvError> {
        let mut state = self.record("INCRBY")?;
        add(&mut state, key, delta)
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64, KvError> {
        let mut state = self.record("DECRBY")?;
        add(&mut state, key, -delta)
    }
}

fn add(state: &mut State, key: &str, delta: i64) -> Result<i64, KvError> {
    let current = match state.entries.get(key) {
        None => 0,
        Some(Entry::Str(text)) => text.parse::<i64>().map_err(|_| {
            KvError::Redis(redis::RedisError::from((
                redis::ErrorKind::TypeError,
                "ERR value is not an integer or out of range",
            )))
        })?,
        Some(_) => return Err(wrong_type()),
    };
    let next = current + delta;
    state
        .entries
        .insert(key.to_string(), Entry::Str(next.to_string()));
    Ok(next)
}

/// Connector handing out a fixed backend, counting connection attempts.
/// The first `failures` attempts are refused.
pub(crate) struct TestConnector {
    backend: Arc<RecordingBackend>,
    attempts: AtomicUsize,
    failures: usize,
    delay: Duration,
}

impl TestConnector {
    pub(crate) fn new(backend: Arc<RecordingBackend>) -> Self {
        Self {
            backend,
            attempts: AtomicUsize::new(0),
            failures: 0,
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn failing_first(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for TestConnector {
    async fn connect(&self, _properties: &StoreProperties) -> Result<Arc<dyn KvBackend>, KvError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if attempt < self.failures {
            return Err(KvError::ConnectionFailed("connection refused".to_string()));
        }
        Ok(self.backend.clone())
    }
}

pub(crate) fn enabled_properties() -> StoreProperties {
    StoreProperties {
        enabled: true,
        ..Default::default()
    }
}

#[test]
fn test_glob_matches() {
    assert!(glob_matches("*", "anything"));
    assert!(glob_matches("user:*", "user:1"));
    assert!(!glob_matches("user:*", "order:1"));
    assert!(glob_matches("*:1", "user:1"));
    assert!(glob_matches("exact", "exact"));
    assert!(!glob_matches("exact", "exactly"));
}
