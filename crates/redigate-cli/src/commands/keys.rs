use clap::Args;
use redigate_kv::Operation;

use super::{print_reported, StoreArgs};

#[derive(Args)]
pub struct KeysCommand {
    /// Glob-style pattern
    #[arg(default_value = "*")]
    pub pattern: String,
}

impl KeysCommand {
    pub fn execute(self, store: &StoreArgs) -> anyhow::Result<()> {
        let gate = store.open()?.gate();
        let rt = tokio::runtime::Runtime::new()?;

        let operation = Operation::new("keys").with_field("redis_pattern", &self.pattern);
        let reported = rt.block_on(gate.call(operation, move |kv| async move {
            kv.keys(&self.pattern).await
        }));
        print_reported(&reported)
    }
}

/// List every key with its type
#[derive(Args)]
pub struct TypesCommand {}

impl TypesCommand {
    pub fn execute(self, store: &StoreArgs) -> anyhow::Result<()> {
        let gate = store.open()?.gate();
        let rt = tokio::runtime::Runtime::new()?;

        let reported = rt.block_on(gate.call(Operation::new("key_types"), |kv| async move {
            kv.key_types().await
        }));
        print_reported(&reported)
    }
}
