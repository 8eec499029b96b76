use clap::Args;
use tracing::info;

use super::StoreArgs;

#[derive(Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub fn execute(self, store: &StoreArgs) -> anyhow::Result<()> {
        let redigate = store.open()?;
        let provider = redigate.provider();
        info!("{}", provider.properties());

        let rt = tokio::runtime::Runtime::new()?;
        let status = rt.block_on(provider.status());

        println!("{}", serde_json::to_string_pretty(&status)?);
        Ok(())
    }
}
