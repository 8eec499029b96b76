use std::time::Duration;

use clap::Args;
use redigate_kv::Operation;
use serde_json::Value;

use super::{print_reported, StoreArgs};

fn whole_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Args)]
pub struct GetCommand {
    pub key: String,
}

impl GetCommand {
    pub fn execute(self, store: &StoreArgs) -> anyhow::Result<()> {
        let gate = store.open()?.gate();
        let rt = tokio::runtime::Runtime::new()?;

        let operation = Operation::new("get_cache_object").key(&self.key);
        let reported = rt.block_on(gate.call(operation, move |kv| async move {
            kv.get_cache_object::<Value>(&self.key).await
        }));
        print_reported(&reported)
    }
}

#[derive(Args)]
pub struct SetCommand {
    pub key: String,

    pub value: String,

    /// Parse the value as JSON instead of storing it as a string
    #[arg(long)]
    pub json: bool,

    /// Expire the key after this many milliseconds
    #[arg(long)]
    pub ttl_ms: Option<u64>,
}

impl SetCommand {
    pub fn execute(self, store: &StoreArgs) -> anyhow::Result<()> {
        let value: Value = if self.json {
            serde_json::from_str(&self.value)?
        } else {
            Value::String(self.value)
        };

        let gate = store.open()?.gate();
        let rt = tokio::runtime::Runtime::new()?;
        let key = self.key;

        let reported = match self.ttl_ms.map(Duration::from_millis) {
            Some(ttl) => {
                let operation = Operation::new("set_cache_object_ex").key(&key).timeout(ttl);
                rt.block_on(gate.call(operation, move |kv| async move {
                    kv.set_cache_object_ex(&key, &value, ttl).await
                }))
            }
            None => {
                let operation = Operation::new("set_cache_object").key(&key);
                rt.block_on(gate.call(operation, move |kv| async move {
                    kv.set_cache_object(&key, &value).await
                }))
            }
        };
        print_reported(&reported)
    }
}

#[derive(Args)]
pub struct DelCommand {
    pub key: String,
}

impl DelCommand {
    pub fn execute(self, store: &StoreArgs) -> anyhow::Result<()> {
        let gate = store.open()?.gate();
        let rt = tokio::runtime::Runtime::new()?;

        let operation = Operation::new("remove_object").key(&self.key);
        let reported = rt.block_on(gate.call(operation, move |kv| async move {
            kv.remove_object(&self.key).await
        }));
        print_reported(&reported)
    }
}

#[derive(Args)]
pub struct ExpireCommand {
    pub key: String,

    /// Time to live in milliseconds
    pub ttl_ms: u64,
}

impl ExpireCommand {
    pub fn execute(self, store: &StoreArgs) -> anyhow::Result<()> {
        let gate = store.open()?.gate();
        let rt = tokio::runtime::Runtime::new()?;
        let ttl = Duration::from_millis(self.ttl_ms);

        let operation = Operation::new("expire").key(&self.key).timeout(ttl);
        let reported = rt.block_on(gate.call(operation, move |kv| async move {
            kv.expire(&self.key, ttl).await
        }));
        print_reported(&reported)
    }
}

#[derive(Args)]
pub struct TtlCommand {
    pub key: String,
}

impl TtlCommand {
    pub fn execute(self, store: &StoreArgs) -> anyhow::Result<()> {
        let gate = store.open()?.gate();
        let rt = tokio::runtime::Runtime::new()?;

        let operation = Operation::new("ttl").key(&self.key);
        let reported = rt.block_on(gate.call(operation, move |kv| async move {
            kv.ttl(&self.key)
                .await
                .map(|ttl| ttl.map(whole_millis))
        }));
        print_reported(&reported)
    }
}

#[derive(Args)]
pub struct PersistCommand {
    pub key: String,
}

impl PersistCommand {
    pub fn execute(self, store: &StoreArgs) -> anyhow::Result<()> {
        let gate = store.open()?.gate();
        let rt = tokio::runtime::Runtime::new()?;

        let operation = Operation::new("persist").key(&self.key);
        let reported = rt.block_on(gate.call(operation, move |kv| async move {
            kv.persist(&self.key).await
        }));
        print_reported(&reported)
    }
}

#[derive(Args)]
pub struct InspectCommand {
    pub key: String,
}

impl InspectCommand {
    pub fn execute(self, store: &StoreArgs) -> anyhow::Result<()> {
        let gate = store.open()?.gate();
        let rt = tokio::runtime::Runtime::new()?;

        let operation = Operation::new("inspect").key(&self.key);
        let reported = rt.block_on(gate.call(operation, move |kv| async move {
            kv.inspect(&self.key).await
        }));
        print_reported(&reported)
    }
}
