// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `passtore tab` subcommands.

use clap::Subcommand;
use passtore_core::{MoveDirection, PasstoreError, Tab};
use passtore_storage::Session;

#[derive(Subcommand, Debug)]
pub enum TabCommands {
    /// List tabs in display order.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Create a tab at the end of the strip.
    Add {
        name: String,
        /// Tab colour as #rrggbb.
        #[arg(long, default_value = "#e0e0e0")]
        color: String,
    },
    /// Rename a tab.
    Rename { id: i64, name: String },
    /// Change a tab's colour.
    Color { id: i64, color: String },
    /// Move a tab one place left or right.
    Move {
        id: i64,
        /// left or right (also up or down).
        direction: MoveDirection,
    },
    /// Put tabs in the given order. Every tab id must appear once.
    Reorder {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Delete a tab and every credential in it.
    Delete {
        id: i64,
        /// Confirm deletion.
        #[arg(long)]
        yes: bool,
    },
}

pub async fn run(session: &Session, action: TabCommands) -> Result<(), PasstoreError> {
    match action {
        TabCommands::List { json } => {
            let tabs = session.list_tabs().await?;
            if json {
                println!("{}", crate::to_json(&tabs)?);
            } else {
                for tab in &tabs {
                    println!("{}", format_tab(tab));
                }
            }
        }
        TabCommands::Add { name, color } => {
            let tab = session.create_tab(&name, &color).await?;
            println!("created tab {}", tab.id);
        }
        TabCommands::Rename { id, name } => {
            session.rename_tab(id, &name).await?;
        }
        TabCommands::Color { id, color } => {
            session.recolor_tab(id, &color).await?;
        }
        TabCommands::Move { id, direction } => {
            if !session.move_tab(id, direction).await? {
                println!("tab {id} is already at the {} end", end_name(direction));
            }
        }
        TabCommands::Reorder { ids } => {
            session.reorder_tabs(&ids).await?;
        }
        TabCommands::Delete { id, yes } => {
            if !yes {
                return Err(PasstoreError::InvalidArgument(format!(
                    "deleting tab {id} also deletes its credentials; pass --yes to confirm"
                )));
            }
            let removed = session.delete_tab(id).await?;
            println!("deleted tab {id} and {removed} credential(s)");
        }
    }
    Ok(())
}

fn end_name(direction: MoveDirection) -> &'static str {
    match direction {
        MoveDirection::Up => "left",
        MoveDirection::Down => "right",
    }
}

fn format_tab(tab: &Tab) -> String {
    format!("{:>4}  {}  {}", tab.id, tab.color, tab.name)
}
