//! Redigate CLI - gated access to a Redis key-value store
//!
//! Every subcommand runs one store operation through the availability gate
//! and prints the value together with its operation report as JSON.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{
    CounterCommand, DelCommand, Direction, ExpireCommand, GetCommand, InspectCommand,
    KeysCommand, PersistCommand, PublishCommand, SetCommand, StatusCommand, StoreArgs,
    TtlCommand, TypesCommand,
};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "REDIGATE_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "REDIGATE_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether the store is enabled and reachable
    Status(StatusCommand),
    /// Read a value
    Get(GetCommand),
    /// Write a value
    Set(SetCommand),
    /// Delete a key
    Del(DelCommand),
    /// Increment a counter
    Incr(CounterCommand),
    /// Decrement a counter
    Decr(CounterCommand),
    /// Set a key's time to live
    Expire(ExpireCommand),
    /// Show a key's remaining time to live in milliseconds
    Ttl(TtlCommand),
    /// Remove a key's expiry
    Persist(PersistCommand),
    /// List keys matching a pattern
    Keys(KeysCommand),
    /// List every key with its type
    Types(TypesCommand),
    /// Show a key's raw contents according to its type
    Inspect(InspectCommand),
    /// Publish a message to a channel
    Publish(PublishCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = cli.log_level.clone();

    // If RUST_LOG is set, use it directly; otherwise our crates at the requested
    // level and the client library at warn
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .context("Invalid RUST_LOG environment variable")?
    } else {
        tracing_subscriber::EnvFilter::new(format!(
            "redigate={level},\
             redigate_cli={level},\
             redigate_core={level},\
             redigate_kv={level},\
             redis=warn",
            level = log_level
        ))
    };

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .boxed(),
        _ => tracing_subscriber::fmt::layer() // "compact" or any other value
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default subscriber")?;

    let store = cli.store;
    match cli.command {
        Commands::Status(cmd) => cmd.execute(&store),
        Commands::Get(cmd) => cmd.execute(&store),
        Commands::Set(cmd) => cmd.execute(&store),
        Commands::Del(cmd) => cmd.execute(&store),
        Commands::Incr(cmd) => cmd.execute(&store, Direction::Increase),
        Commands::Decr(cmd) => cmd.execute(&store, Direction::Decrease),
        Commands::Expire(cmd) => cmd.execute(&store),
        Commands::Ttl(cmd) => cmd.execute(&store),
        Commands::Persist(cmd) => cmd.execute(&store),
        Commands::Keys(cmd) => cmd.execute(&store),
        Commands::Types(cmd) => cmd.execute(&store),
        Commands::Inspect(cmd) => cmd.execute(&store),
        Commands::Publish(cmd) => cmd.execute(&store),
    }
}
