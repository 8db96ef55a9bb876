use anyhow::{Context, Result};
use clap::Parser;
use meetsync::{
    api::ApiServer,
    cli::{
        handle_auth_command, handle_meetings_command, handle_participants_command,
        handle_recordings_command, handle_remote_command, handle_stats_command,
        handle_sync_command, Cli, CliCommand,
    },
    config::Config,
    engine::Engine,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Some(CliCommand::Version) = cli.command {
        println!("meetsync {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::load().context("Failed to load configuration")?;
    let engine = Engine::from_config(&config).context("Failed to create backend client")?;

    match cli.command {
        Some(CliCommand::Auth(args)) => handle_auth_command(&engine, args).await,
        Some(CliCommand::Remote { category }) => handle_remote_command(&engine, category).await,
        Some(CliCommand::Meetings(args)) => handle_meetings_command(&engine, args).await,
        Some(CliCommand::Sync { id }) => handle_sync_command(&engine, id).await,
        Some(CliCommand::Participants { id }) => handle_participants_command(&engine, id).await,
        Some(CliCommand::Recordings(args)) => handle_recordings_command(&engine, args).await,
        Some(CliCommand::Stats { id, backend }) => {
            handle_stats_command(&engine, id, backend).await
        }
        Some(CliCommand::Serve) | None => {
            info!("Starting meetsync v{}", env!("CARGO_PKG_VERSION"));
            ApiServer::new(Arc::new(engine), &config).start().await
        }
        Some(CliCommand::Version) => Ok(()),
    }
}
