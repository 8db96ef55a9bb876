//! CLI handler for `auth` commands.

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm};

use crate::auth::Confirmed;
use crate::cli::args::{AuthCliArgs, AuthCommand};
use crate::engine::Engine;
use crate::events::EngineEvent;

pub async fn handle_auth_command(engine: &Engine, args: AuthCliArgs) -> Result<()> {
    match args.command {
        AuthCommand::Status => show_status(engine).await,
        AuthCommand::Connect => connect(engine).await,
        AuthCommand::Disconnect { yes } => disconnect(engine, yes).await,
        AuthCommand::Watch => watch(engine).await,
    }
}

async fn show_status(engine: &Engine) -> Result<()> {
    let authenticated = engine.check_status().await;
    let state = engine.auth_state().await;

    if authenticated {
        println!("Connected to the provider.");
    } else {
        println!("Not connected. Run `meetsync auth connect` to connect your account.");
    }
    if let Some(error) = state.last_error {
        println!("Status check failed: {}", error);
    }
    Ok(())
}

async fn connect(engine: &Engine) -> Result<()> {
    let url = engine
        .initiate_connect()
        .await
        .context("Failed to get authorization URL")?;

    println!("Open this URL in your browser to connect your account:");
    println!();
    println!("  {}", url);
    println!();
    println!("Then run `meetsync auth status` to confirm.");
    Ok(())
}

async fn disconnect(engine: &Engine, yes: bool) -> Result<()> {
    let answer = yes
        || Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Disconnect your account? Synced meeting views will need to be reloaded.")
            .default(false)
            .interact()?;

    let Some(confirmed) = Confirmed::from_answer(answer) else {
        println!("Cancelled.");
        return Ok(());
    };

    engine
        .disconnect(confirmed)
        .await
        .context("Failed to disconnect")?;
    println!("Disconnected.");
    Ok(())
}

async fn watch(engine: &Engine) -> Result<()> {
    let mut events = engine.subscribe();
    let poller = engine.spawn_auth_poller();
    println!("Watching connection status (Ctrl+C to stop)...");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(EngineEvent::AuthChanged { authenticated }) => {
                    let now = chrono::Local::now().format("%H:%M:%S");
                    if authenticated {
                        println!("[{}] connected", now);
                    } else {
                        println!("[{}] not connected", now);
                    }
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    poller.stop().await;
    Ok(())
}
