//! Redis implementation of the backend seam

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::trace;

use super::{duration_millis, KvBackend};
use crate::error::KvError;

/// Backend over a multiplexed Redis connection.
///
/// `ConnectionManager` is cheap to clone and reconnects on its own, so each
/// command works on a fresh clone instead of locking a shared connection.
#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
}

impl RedisBackend {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    fn conn(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

#[async_trait]
impl KvBackend for RedisBackend {
    async fn ping(&self) -> Result<String, KvError> {
        let mut conn = self.conn();
        let reply: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(reply)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        let mut conn = self.conn();
        trace!("KEYS {}", pattern);
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool, KvError> {
        let mut conn = self.conn();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn key_type(&self, key: &str) -> Result<String, KvError> {
        let mut conn = self.conn();
        let kind: String = redis::cmd("TYPE").arg(key).query_async(&mut conn).await?;
        Ok(kind)
    }

    async fn del(&self, key: &str) -> Result<bool, KvError> {
        let mut conn = self.conn();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn pexpire(&self, key: &str, ttl: Duration) -> Result<bool, KvError> {
        let mut conn = self.conn();
        let set: i64 = redis::cmd("PEXPIRE")
            .arg(key)
            .arg(duration_millis(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(set == 1)
    }

    async fn pttl(&self, key: &str) -> Result<i64, KvError> {
        let mut conn = self.conn();
        let millis: i64 = redis::cmd("PTTL").arg(key).query_async(&mut conn).await?;
        Ok(millis)
    }

    async fn persist(&self, key: &str) -> Result<bool, KvError> {
        let mut conn = self.conn();
        let cleared: i64 = redis::cmd("PERSIST").arg(key).query_async(&mut conn).await?;
        Ok(cleared == 1)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), KvError> {
        let mut conn = self.conn();

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(duration_millis(ttl));
        }

        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut conn = self.conn();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn rpush(&self, key: &str, values: &[String]) -> Result<usize, KvError> {
        let mut conn = self.conn();
        let len: usize = conn.rpush(key, values).await?;
        Ok(len)
    }

    async fn lrange_all(&self, key: &str) -> Result<Vec<String>, KvError> {
        let mut conn = self.conn();
        let items: Vec<String> = conn.lrange(key, 0, -1).await?;
        Ok(items)
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<usize, KvError> {
        let mut conn = self.conn();
        let added: usize = conn.sadd(key, members).await?;
        Ok(added)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, KvError> {
        let mut conn = self.conn();
        let members: Vec<String> = conn.smembers(key).await?;
        Ok(members)
    }

    async fn zrange_all(&self, key: &str) -> Result<Vec<(String, f64)>, KvError> {
        let mut conn = self.conn();
        let members: Vec<(String, f64)> = conn.zrange_withscores(key, 0, -1).await?;
        Ok(members)
    }

    async fn hset(&self, key: &str, entries: &[(String, String)]) -> Result<(), KvError> {
        let mut conn = self.conn();
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in entries {
            cmd.arg(field).arg(value);
        }
        let _: i64 = cmd.query_async(&mut conn).await?;
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, KvError> {
        let mut conn = self.conn();
        let entries: HashMap<String, String> = conn.hgetall(key).await?;
        Ok(entries)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, KvError> {
        let mut conn = self.conn();
        let value: Option<String> = conn.hget(key, field).await?;
        Ok(value)
    }

    async fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>, KvError> {
        let mut conn = self.conn();
        let values: Vec<Option<String>> = redis::cmd("HMGET")
            .arg(key)
            .arg(fields)
            .query_async(&mut conn)
            .await?;
        Ok(values)
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<i64, KvError> {
        let mut conn = self.conn();
        let receivers: i64 = conn.publish(channel, message).await?;
        Ok(receivers)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, KvError> {
        let mut conn = self.conn();
        let value: i64 = conn.incr(key, delta).await?;
        Ok(value)
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64, KvError> {
        let mut conn = self.conn();
        let value: i64 = conn.decr(key, delta).await?;
        Ok(value)
    }
}
