use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shared::config::{load_config, load_dotenv, validate_config};
use todo_server::{AppState, server};

#[derive(Debug, Parser)]
#[command(name = "todo-server", version, about = "Multi-tenant to-do list server")]
struct Args {
    /// TOML configuration file; defaults apply when omitted
    #[arg(long, env = "TODO_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port (overrides config and APPLICATION_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// SQLite URL, e.g. sqlite://todo.db (overrides config and DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    load_dotenv();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = args.database_url {
        config.database.url = url;
    }
    validate_config(&config).context("Invalid configuration")?;

    let state = AppState::build(config).await?;
    server::run(state, server::shutdown_signal()).await?;

    info!("Server stopped");
    Ok(())
}
