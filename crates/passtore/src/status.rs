// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `passtore status` command implementation.
//!
//! Reports store location, encryption state, tab and credential counts and
//! the current theme. Needs no master password.

use std::io::IsTerminal;

use passtore_config::PasstoreConfig;
use passtore_core::PasstoreError;
use passtore_storage::Session;
use serde::Serialize;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub database_path: String,
    pub master_password_set: bool,
    pub encrypted: bool,
    pub tabs: usize,
    pub credentials: usize,
    pub theme: String,
}

/// Run the `passtore status` command.
pub async fn run_status(
    session: &Session,
    config: &PasstoreConfig,
    json: bool,
    plain: bool,
) -> Result<(), PasstoreError> {
    let tabs = session.list_tabs().await?;
    let mut credentials = 0;
    for tab in &tabs {
        credentials += session.store().get_by_group(tab.id, None).await?.len();
    }

    let status = StatusResponse {
        database_path: config.store.database_path.clone(),
        master_password_set: session.has_master_password().await?,
        encrypted: session.is_store_encrypted().await?,
        tabs: tabs.len(),
        credentials,
        theme: session.theme().await?.to_string(),
    };

    if json {
        println!("{}", crate::to_json(&status)?);
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_status(&status, use_color);
    }
    Ok(())
}

fn print_status(status: &StatusResponse, use_color: bool) {
    println!();
    println!("  passtore status");
    println!("  {}", "-".repeat(35));
    println!("    Database:    {}", status.database_path);

    let (label, ok) = match (status.master_password_set, status.encrypted) {
        (_, true) => ("encrypted", true),
        (true, false) => ("plaintext (run `passtore migrate`)", false),
        (false, false) => ("plaintext (run `passtore init`)", false),
    };
    if use_color {
        use colored::Colorize;
        if ok {
            println!("    Encryption:  {} {}", "✓".green(), label.green());
        } else {
            println!("    Encryption:  {} {}", "!".yellow(), label.yellow());
        }
    } else if ok {
        println!("    Encryption:  [OK] {label}");
    } else {
        println!("    Encryption:  [WARN] {label}");
    }

    println!("    Tabs:        {}", status.tabs);
    println!("    Credentials: {}", status.credentials);
    println!("    Theme:       {}", status.theme);
    println!();
}
