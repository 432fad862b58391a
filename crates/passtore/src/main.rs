// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Passtore - a local credential store with field-level encryption.
//!
//! This is the binary entry point. Every command opens the configured store
//! through a [`Session`] and works on plaintext records.

mod credentials;
mod master;
mod status;
mod tabs;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use passtore_config::PasstoreConfig;
use passtore_core::{PasstoreError, Theme};
use passtore_storage::Session;

/// Passtore - a local credential store with field-level encryption.
#[derive(Parser, Debug)]
#[command(name = "passtore", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Set the master password and encrypt the store.
    Init,
    /// Show store state.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Manage tabs (credential groups).
    Tab {
        #[command(subcommand)]
        action: tabs::TabCommands,
    },
    /// Manage credentials.
    Cred {
        #[command(subcommand)]
        action: credentials::CredCommands,
    },
    /// Encrypt a store that still holds plaintext fields.
    Migrate,
    /// Change the master password and re-encrypt every field.
    ChangePassword,
    /// Show, set or cycle the colour theme.
    Theme {
        /// Theme to store (Light, Semi-Dark, Dark).
        set: Option<Theme>,
        /// Advance to the next theme.
        #[arg(long, conflicts_with = "set")]
        cycle: bool,
    },
    /// Renumber a tab's credentials to 1..n.
    Compact {
        /// Tab id.
        tab: i64,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => passtore_config::load_and_validate_path(path),
        None => passtore_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            passtore_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &PasstoreConfig) -> Result<(), PasstoreError> {
    if let Commands::Config = command {
        let rendered = config
            .to_toml()
            .map_err(|e| PasstoreError::Internal(format!("failed to render config: {e}")))?;
        print!("{rendered}");
        return Ok(());
    }

    tracing::debug!(path = %config.store.database_path, "opening store");
    let session = Session::open(config).await?;
    let result = dispatch(command, &session, config).await;
    session.close().await?;
    result
}

async fn dispatch(
    command: Commands,
    session: &Session,
    config: &PasstoreConfig,
) -> Result<(), PasstoreError> {
    match command {
        Commands::Init => master::run_init(session).await,
        Commands::Status { json, plain } => status::run_status(session, config, json, plain).await,
        Commands::Tab { action } => tabs::run(session, action).await,
        Commands::Cred { action } => credentials::run(session, action).await,
        Commands::Migrate => master::run_migrate(session).await,
        Commands::ChangePassword => master::run_change_password(session).await,
        Commands::Theme { set, cycle } => {
            let theme = match (set, cycle) {
                (Some(theme), _) => {
                    session.set_theme(theme).await?;
                    theme
                }
                (None, true) => session.cycle_theme().await?,
                (None, false) => session.theme().await?,
            };
            println!("{theme}");
            Ok(())
        }
        Commands::Compact { tab } => {
            let changed = session.compact_tab(tab).await?;
            println!("renumbered {changed} credential(s)");
            Ok(())
        }
        Commands::Config => Ok(()),
    }
}

/// Pretty-printed JSON for `--json` output.
pub(crate) fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, PasstoreError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| PasstoreError::Internal(format!("failed to serialize output: {e}")))
}

/// Initialize tracing with an EnvFilter built from the configured level.
///
/// `RUST_LOG` takes precedence when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("passtore={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
