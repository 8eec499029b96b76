pub mod counter;
pub mod keys;
pub mod publish;
pub mod status;
pub mod value;

pub use counter::{CounterCommand, Direction};
pub use keys::{KeysCommand, TypesCommand};
pub use publish::PublishCommand;
pub use status::StatusCommand;
pub use value::{
    DelCommand, ExpireCommand, GetCommand, InspectCommand, PersistCommand, SetCommand,
    TtlCommand,
};

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use redigate_core::StoreProperties;
use redigate_kv::{Redigate, Reported};
use serde::Serialize;
use tracing::debug;

/// Store connection flags shared by every subcommand.
///
/// Layering: YAML file (or defaults), then `REDIGATE_*` variables, then these flags.
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// YAML file with store properties
    #[arg(long, env = "REDIGATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable or disable the store (overrides file and environment)
    #[arg(long, global = true)]
    pub enabled: Option<bool>,

    /// Log every store operation at info level
    #[arg(long, global = true)]
    pub debugging: bool,

    /// Redis host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Redis port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Redis ACL username
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Redis password
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Logical database index
    #[arg(long, global = true)]
    pub database: Option<i64>,
}

impl StoreArgs {
    pub fn load(&self) -> anyhow::Result<StoreProperties> {
        let base = match &self.config {
            Some(path) => StoreProperties::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => StoreProperties::default(),
        };
        let mut properties = base.with_env_overrides()?;

        if let Some(enabled) = self.enabled {
            properties.enabled = enabled;
        }
        if self.debugging {
            properties.debugging = true;
        }
        if let Some(host) = &self.host {
            properties.host = host.clone();
        }
        if let Some(port) = self.port {
            properties.port = port;
        }
        if let Some(username) = &self.username {
            properties.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            properties.password = Some(password.clone());
        }
        if let Some(database) = self.database {
            properties.database = database;
        }

        debug!("Loaded store properties: {}", properties);
        Ok(properties)
    }

    pub fn open(&self) -> anyhow::Result<Redigate> {
        Ok(Redigate::connect(self.load()?)?)
    }
}

/// Print the value and report as JSON; a failed report becomes the command's error
pub fn print_reported<T: Serialize>(reported: &Reported<T>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(reported)?);
    if !reported.is_success() {
        anyhow::bail!("{}", reported.report);
    }
    Ok(())
}
