//! MUSE state console
//!
//! Loads a show config into a fresh store, then reads commands from stdin:
//! - `get` / `set` / `dispatch` against the store
//! - `watch` prints changes as they happen

use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use muse_state::config::default_config_path;
use muse_state::console::HELP;
use muse_state::constants::{APP_NAME, APP_VERSION, LOG_FILE};
use muse_state::{parse_command, AppState, ConsoleCommand, ShowConfig, StateHandle};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    let config = ShowConfig::load_or_default(&config_path)?;

    let mut state = AppState::new();
    config.seed(&mut state)?;

    let (handle, task) = StateHandle::spawn(state);
    tracing::info!(config = %config_path.display(), "{} {} ready", APP_NAME, APP_VERSION);
    println!("{} {} - type 'help' for commands", APP_NAME, APP_VERSION);

    run_console(&handle).await?;

    handle.shutdown();
    task.await?;
    Ok(())
}

/// Read and execute console commands until `quit` or end of input
async fn run_console(handle: &StateHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("error: {}", e);
                continue;
            }
        };

        if matches!(command, ConsoleCommand::Quit) {
            break;
        }
        if let Err(e) = execute(handle, command).await {
            tracing::warn!(error = %e, "Console command failed");
            println!("error: {}", e);
        }
    }

    Ok(())
}

async fn execute(handle: &StateHandle, command: ConsoleCommand) -> Result<()> {
    match command {
        ConsoleCommand::Get(path) => match handle.get(&path).await? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => println!("{} is not set", path),
        },
        ConsoleCommand::Set { path, value } => handle.set(&path, value).await?,
        ConsoleCommand::Dispatch { path, value } => handle.dispatch(&path, value).await?,
        ConsoleCommand::Watch(path) => {
            let (id, mut changes) = handle.subscribe(&path).await?;
            println!("watching {} as {}", path, id);
            tokio::spawn(async move {
                while let Some(change) = changes.recv().await {
                    let old = change
                        .old_value
                        .as_ref()
                        .map_or_else(|| String::from("<unset>"), |v| v.to_string());
                    let source = if change.is_exact() {
                        change.path.clone()
                    } else {
                        format!("{} <- {}", change.path, change.origin)
                    };
                    println!(
                        "[{}] {}: {} -> {}{}",
                        id,
                        source,
                        old,
                        change.new_value,
                        if change.forced { " (dispatch)" } else { "" }
                    );
                }
            });
        }
        ConsoleCommand::Unwatch(id) => {
            if !handle.unsubscribe(id).await? {
                println!("no watch {}", id);
            }
        }
        ConsoleCommand::Dump => {
            println!("{}", serde_json::to_string_pretty(&handle.snapshot().await?)?);
        }
        ConsoleCommand::Help => println!("{}", HELP),
        ConsoleCommand::Quit => {}
    }

    Ok(())
}
