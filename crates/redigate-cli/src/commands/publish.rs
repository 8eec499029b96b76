use clap::Args;
use redigate_kv::Operation;
use serde_json::Value;

use super::{print_reported, StoreArgs};

#[derive(Args)]
pub struct PublishCommand {
    pub channel: String,

    pub message: String,

    /// Parse the message as JSON instead of sending it as a string
    #[arg(long)]
    pub json: bool,
}

impl PublishCommand {
    pub fn execute(self, store: &StoreArgs) -> anyhow::Result<()> {
        let message: Value = if self.json {
            serde_json::from_str(&self.message)?
        } else {
            Value::String(self.message)
        };

        let gate = store.open()?.gate();
        let rt = tokio::runtime::Runtime::new()?;
        let channel = self.channel;

        let operation = Operation::new("produce").channel(&channel);
        let reported = rt.block_on(gate.call(operation, move |kv| async move {
            kv.produce(&channel, &message).await
        }));
        print_reported(&reported)
    }
}
