use std::time::Duration;

use clap::Args;
use redigate_kv::Operation;

use super::{print_reported, StoreArgs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

#[derive(Args)]
pub struct CounterCommand {
    pub key: String,

    /// Amount to add or subtract
    #[arg(long, default_value_t = 1)]
    pub by: i64,

    /// Expire the counter this many milliseconds after the update
    #[arg(long)]
    pub ttl_ms: Option<u64>,
}

impl CounterCommand {
    pub fn execute(self, store: &StoreArgs, direction: Direction) -> anyhow::Result<()> {
        let gate = store.open()?.gate();
        let rt = tokio::runtime::Runtime::new()?;

        let ttl = self.ttl_ms.map(Duration::from_millis);
        let name = match (direction, ttl.is_some()) {
            (Direction::Increase, false) => "increase_key_by",
            (Direction::Increase, true) => "increase_key_by_ex",
            (Direction::Decrease, false) => "decrease_key_by",
            (Direction::Decrease, true) => "decrease_key_by_ex",
        };
        let mut operation = Operation::new(name)
            .key(&self.key)
            .with_field("redis_amount", self.by);
        if let Some(ttl) = ttl {
            operation = operation.timeout(ttl);
        }

        let (key, by) = (self.key, self.by);
        let reported = rt.block_on(gate.call(operation, move |kv| async move {
            match (direction, ttl) {
                (Direction::Increase, None) => kv.increase_key_by(&key, by).await,
                (Direction::Increase, Some(ttl)) => kv.increase_key_by_ex(&key, by, ttl).await,
                (Direction::Decrease, None) => kv.decrease_key_by(&key, by).await,
                (Direction::Decrease, Some(ttl)) => kv.decrease_key_by_ex(&key, by, ttl).await,
            }
        }));
        print_reported(&reported)
    }
}
