//! Serenity - an ambient sound mixer with a sleep timer
//!
//! Mix looping ambient sounds at independent volumes:
//! - `serenity daemon` owns audio playback and the sleep timer
//! - every other command talks to it over a Unix socket

use anyhow::Result;
use clap::{CommandFactory, Parser};

use serenity::catalog::Catalog;
use serenity::cli::{Cli, Commands, DaemonArgs, Display, IpcClient, TimerAction};
use serenity::daemon;
use serenity::types::DaemonConfig;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    let is_daemon = matches!(cli.command, Some(Commands::Daemon(_)));
    init_tracing(cli.verbose || is_daemon);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let socket = cli.socket;

    match cli.command {
        Some(Commands::List { category }) => {
            Display::show_catalog(&Catalog::builtin(), category);
        }
        Some(Commands::Set { track, volume }) => {
            let client = IpcClient::from_option(socket)?;
            let response = client.set_volume(&track, volume).await?;
            Display::show_volume_set(&response);
        }
        Some(Commands::Stop) => {
            let client = IpcClient::from_option(socket)?;
            let response = client.stop_all().await?;
            Display::show_stop_success(&response);
        }
        Some(Commands::Timer(TimerAction::Start { minutes })) => {
            let client = IpcClient::from_option(socket)?;
            let response = client.start_timer(minutes).await?;
            Display::show_timer_started(&response);
        }
        Some(Commands::Timer(TimerAction::Cancel)) => {
            let client = IpcClient::from_option(socket)?;
            let response = client.cancel_timer().await?;
            Display::show_timer_cancelled(&response);
        }
        Some(Commands::Timer(TimerAction::Presets)) => {
            Display::show_presets();
        }
        Some(Commands::Lock) => {
            let client = IpcClient::from_option(socket)?;
            let response = client.lock().await?;
            Display::show_lock_state(&response);
        }
        Some(Commands::Unlock) => {
            let client = IpcClient::from_option(socket)?;
            let response = client.unlock().await?;
            Display::show_lock_state(&response);
        }
        Some(Commands::Status) => {
            let client = IpcClient::from_option(socket)?;
            let response = client.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::SurfaceStop) => {
            let client = IpcClient::from_option(socket)?;
            let response = client.surface_stop().await?;
            Display::show_stop_success(&response);
        }
        Some(Commands::Daemon(args)) => {
            let config = daemon_config(socket, &args)?;
            daemon::run(config).await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Builds the daemon configuration: config file first, then flags.
fn daemon_config(socket: Option<std::path::PathBuf>, args: &DaemonArgs) -> Result<DaemonConfig> {
    let mut config = match &args.config {
        Some(path) => DaemonConfig::load(path)?,
        None => DaemonConfig::default(),
    };

    if let Some(dir) = &args.media_dir {
        config = config.with_media_dir(dir);
    }
    if let Some(path) = socket {
        config = config.with_socket_path(path);
    }
    if let Some(path) = &args.surface_file {
        config = config.with_surface_path(path);
    }
    if args.silent {
        config.silent = true;
    }

    config
        .validate()
        .map_err(|msg| anyhow::anyhow!("Invalid configuration: {}", msg))?;
    Ok(config)
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_daemon_config_defaults() {
        let config = daemon_config(None, &DaemonArgs::default()).unwrap();
        assert_eq!(config, DaemonConfig::default());
    }

    #[test]
    fn test_daemon_config_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("serenity.json");
        std::fs::write(
            &path,
            r#"{"media_dir":"/from/file","socket_path":"/from/file.sock"}"#,
        )
        .unwrap();

        let args = DaemonArgs {
            config: Some(path),
            media_dir: Some(PathBuf::from("/from/flag")),
            surface_file: None,
            silent: true,
        };
        let config = daemon_config(None, &args).unwrap();

        assert_eq!(config.media_dir, PathBuf::from("/from/flag"));
        assert_eq!(config.socket_path, PathBuf::from("/from/file.sock"));
        assert!(config.silent);

        let config = daemon_config(Some(PathBuf::from("/tmp/flag.sock")), &args).unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/flag.sock"));
    }

    #[test]
    fn test_daemon_config_invalid() {
        let args = DaemonArgs {
            surface_file: Some(PathBuf::from("/tmp/same")),
            ..DaemonArgs::default()
        };
        let err = daemon_config(Some(PathBuf::from("/tmp/same")), &args).unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_daemon_config_missing_file() {
        let args = DaemonArgs {
            config: Some(PathBuf::from("/nonexistent/serenity.json")),
            ..DaemonArgs::default()
        };
        assert!(daemon_config(None, &args).is_err());
    }
}
