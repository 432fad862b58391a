// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `passtore cred` subcommands.
//!
//! Passwords are masked in listings unless `--reveal` is given.

use clap::{Args, Subcommand};
use passtore_core::{Credential, CredentialField, CredentialFields, MoveDirection, PasstoreError, Tab};
use passtore_storage::Session;
use serde::Serialize;

use crate::master;

const MASK: &str = "********";

#[derive(Subcommand, Debug)]
pub enum CredCommands {
    /// List credentials, grouped by tab.
    List {
        /// Only this tab.
        #[arg(long)]
        tab: Option<i64>,
        /// Show passwords in clear.
        #[arg(long)]
        reveal: bool,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Add a credential at the end of a tab.
    Add {
        /// Tab id.
        #[arg(long)]
        tab: i64,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Change fields of a credential. Fields not given keep their value.
    Update {
        id: i64,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a credential.
    Delete { id: i64 },
    /// Move a credential one place up in its tab.
    Up { id: i64 },
    /// Move a credential one place down in its tab.
    Down { id: i64 },
    /// Set the row colour, or clear it when omitted.
    Color { id: i64, color: Option<String> },
}

/// One flag per credential field.
#[derive(Args, Debug, Default)]
pub struct FieldArgs {
    #[arg(long)]
    detail: Option<String>,
    #[arg(long)]
    access_type: Option<String>,
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    contents: Option<String>,
    #[arg(long)]
    instance_type: Option<String>,
    #[arg(long)]
    private_ip: Option<String>,
    #[arg(long)]
    public_ip: Option<String>,
}

impl FieldArgs {
    /// Overwrite every field given on the command line.
    fn apply(self, fields: &mut CredentialFields) {
        let given = [
            (CredentialField::Detail, self.detail),
            (CredentialField::AccessType, self.access_type),
            (CredentialField::Host, self.host),
            (CredentialField::Port, self.port),
            (CredentialField::Username, self.username),
            (CredentialField::Password, self.password),
            (CredentialField::Role, self.role),
            (CredentialField::Contents, self.contents),
            (CredentialField::InstanceType, self.instance_type),
            (CredentialField::PrivateIp, self.private_ip),
            (CredentialField::PublicIp, self.public_ip),
        ];
        for (field, value) in given {
            if value.is_some() {
                fields.set(field, value);
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct TabListing {
    tab: Tab,
    credentials: Vec<Credential>,
}

pub async fn run(session: &Session, action: CredCommands) -> Result<(), PasstoreError> {
    match action {
        CredCommands::List { tab, reveal, json } => {
            master::unlock(session).await?;
            let groups = match tab {
                Some(tab_id) => {
                    let tab = session
                        .list_tabs()
                        .await?
                        .into_iter()
                        .find(|t| t.id == tab_id)
                        .ok_or(PasstoreError::RecordNotFound {
                            entity: "tab",
                            id: tab_id,
                        })?;
                    vec![(tab, session.credentials_in_tab(tab_id).await?)]
                }
                None => session.export_all().await?,
            };
            print_listing(groups, reveal, json)?;
        }
        CredCommands::Add { tab, fields } => {
            master::unlock(session).await?;
            let mut values = CredentialFields::default();
            fields.apply(&mut values);
            let credential = session.add_credential(tab, &values).await?;
            println!(
                "added credential {} at position {}",
                credential.id, credential.display_order
            );
        }
        CredCommands::Update { id, fields } => {
            master::unlock(session).await?;
            let mut current = session
                .get_credential(id)
                .await?
                .ok_or(PasstoreError::RecordNotFound {
                    entity: "credential",
                    id,
                })?;
            if !current.unreadable.is_empty() {
                return Err(PasstoreError::InvalidArgument(format!(
                    "credential {id} has unreadable fields; refusing to overwrite them"
                )));
            }
            fields.apply(&mut current.fields);
            session.update_credential(id, &current.fields).await?;
        }
        CredCommands::Delete { id } => {
            session.delete_credential(id).await?;
        }
        CredCommands::Up { id } => move_credential(session, id, MoveDirection::Up).await?,
        CredCommands::Down { id } => move_credential(session, id, MoveDirection::Down).await?,
        CredCommands::Color { id, color } => {
            session.set_row_color(id, color.as_deref()).await?;
        }
    }
    Ok(())
}

async fn move_credential(
    session: &Session,
    id: i64,
    direction: MoveDirection,
) -> Result<(), PasstoreError> {
    // Group membership and order are stored in clear, so no unlock is needed.
    let credential = session
        .store()
        .get(id, None)
        .await?
        .ok_or(PasstoreError::RecordNotFound {
            entity: "credential",
            id,
        })?;
    if !session
        .move_credential(id, credential.tab_id, direction)
        .await?
    {
        let end = match direction {
            MoveDirection::Up => "top",
            MoveDirection::Down => "bottom",
        };
        println!("credential {id} is already at the {end} of its tab");
    }
    Ok(())
}

fn mask(mut credential: Credential) -> Credential {
    if credential.fields.password.is_some() {
        credential.fields.password = Some(MASK.to_string());
    }
    credential
}

fn print_listing(
    groups: Vec<(Tab, Vec<Credential>)>,
    reveal: bool,
    json: bool,
) -> Result<(), PasstoreError> {
    let groups: Vec<TabListing> = groups
        .into_iter()
        .map(|(tab, credentials)| TabListing {
            tab,
            credentials: if reveal {
                credentials
            } else {
                credentials.into_iter().map(mask).collect()
            },
        })
        .collect();

    if json {
        println!("{}", crate::to_json(&groups)?);
        return Ok(());
    }

    for group in &groups {
        println!("[{}] {}", group.tab.id, group.tab.name);
        for credential in &group.credentials {
            println!("  {}", format_credential(credential));
        }
    }
    Ok(())
}

fn format_credential(credential: &Credential) -> String {
    let show = |field: CredentialField| -> String {
        if credential.unreadable.contains(&field) {
            return "<unreadable>".to_string();
        }
        credential.fields.get(field).unwrap_or("").to_string()
    };
    let host = match credential.fields.port.as_deref() {
        Some(port) if !port.is_empty() => format!("{}:{port}", show(CredentialField::Host)),
        _ => show(CredentialField::Host),
    };
    format!(
        "{:>4}  {:<24} {:<28} {:<16} {}",
        credential.id,
        show(CredentialField::Detail),
        host,
        show(CredentialField::Username),
        show(CredentialField::Password),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential {
            id: 7,
            tab_id: 1,
            fields: CredentialFields::default()
                .with(CredentialField::Detail, "db")
                .with(CredentialField::Host, "10.0.0.5")
                .with(CredentialField::Port, "5432")
                .with(CredentialField::Password, "hunter2"),
            row_color: None,
            display_order: 1,
            unreadable: Vec::new(),
        }
    }

    #[test]
    fn apply_only_overwrites_given_fields() {
        let mut fields = credential().fields;
        let args = FieldArgs {
            username: Some("admin".to_string()),
            ..FieldArgs::default()
        };
        args.apply(&mut fields);
        assert_eq!(fields.username.as_deref(), Some("admin"));
        assert_eq!(fields.host.as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn mask_hides_password_only() {
        let masked = mask(credential());
        assert_eq!(masked.fields.password.as_deref(), Some(MASK));
        assert_eq!(masked.fields.detail.as_deref(), Some("db"));
    }

    #[test]
    fn listing_line_joins_host_and_port() {
        let line = format_credential(&credential());
        assert!(line.contains("10.0.0.5:5432"));
        assert!(line.contains("hunter2"));
    }

    #[test]
    fn json_listing_masks_passwords() {
        let tab = Tab {
            id: 1,
            name: "Principal".to_string(),
            color: "#e0e0e0".to_string(),
            position: 0,
        };
        let groups = vec![TabListing {
            tab,
            credentials: vec![mask(credential())],
        }];
        let rendered = crate::to_json(&groups).unwrap();
        assert!(rendered.contains(MASK));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn unreadable_fields_are_marked() {
        let mut c = credential();
        c.fields.password = None;
        c.unreadable = vec![CredentialField::Password];
        assert!(format_credential(&c).ends_with("<unreadable>"));
    }
}
