use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use repsy::{
    cli::{Cli, Commands},
    commands,
    db::open,
    storage::SqliteStore,
    types::{Config, OutputFmt, Settings},
};

async fn connect(settings: &Settings) -> Result<Arc<SqliteStore>> {
    let pool = open(&settings.db_path)
        .await
        .with_context(|| format!("Could not open database `{}`", settings.db_path))?;
    Ok(Arc::new(SqliteStore::new(pool)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let fmt = OutputFmt::from_flag(cli.json);

    let config_path = Config::default_path().context("Could not determine config directory")?;
    let settings = Config::load(&config_path)?.settings();

    match cli.cmd {
        Commands::Session(cmd) => {
            commands::session::handle(cmd, connect(&settings).await?, &settings, fmt).await?
        }
        Commands::Exercise(cmd) => {
            commands::exercise::handle(cmd, &*connect(&settings).await?, fmt).await?
        }
        Commands::Report(cmd) => {
            commands::report::handle(cmd, &*connect(&settings).await?, &settings, fmt).await?
        }
        Commands::Config(cmd) => commands::config::handle(cmd, &config_path).await?,
    }

    Ok(())
}
