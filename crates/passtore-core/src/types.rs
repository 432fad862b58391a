// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the vault, storage, and CLI crates.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Settings key holding the master password verifier.
pub const SETTING_MASTER_HASH: &str = "master_hash";
/// Settings key holding the base64 key-derivation salt.
pub const SETTING_ENCRYPTION_SALT: &str = "encryption_salt";
/// Settings key holding the `"true"`/`"false"` encrypted-store flag.
pub const SETTING_DATA_ENCRYPTED: &str = "data_encrypted";
/// Settings key holding the selected theme name.
pub const SETTING_THEME: &str = "theme";

/// One of the eleven semantic text fields of a credential.
///
/// The snake_case name doubles as the SQLite column name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CredentialField {
    Detail,
    AccessType,
    Host,
    Port,
    Username,
    Password,
    Role,
    Contents,
    InstanceType,
    PrivateIp,
    PublicIp,
}

impl CredentialField {
    /// All fields in their canonical column order.
    pub const ALL: [CredentialField; 11] = [
        CredentialField::Detail,
        CredentialField::AccessType,
        CredentialField::Host,
        CredentialField::Port,
        CredentialField::Username,
        CredentialField::Password,
        CredentialField::Role,
        CredentialField::Contents,
        CredentialField::InstanceType,
        CredentialField::PrivateIp,
        CredentialField::PublicIp,
    ];
}

/// The eleven semantic fields of a credential, accessed by name.
///
/// `None` means the field is absent. Values are plaintext at the collaborator
/// boundary and tokens inside the storage layer once encryption is active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialFields {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub access_type: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub contents: Option<String>,
    #[serde(default)]
    pub instance_type: Option<String>,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub public_ip: Option<String>,
}

impl CredentialFields {
    /// Borrow the value of a field.
    pub fn get(&self, field: CredentialField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Replace the value of a field.
    pub fn set(&mut self, field: CredentialField, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    /// Builder-style [`set`](Self::set) for a present value.
    pub fn with(mut self, field: CredentialField, value: impl Into<String>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    /// Iterate over `(field, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (CredentialField, Option<&str>)> + '_ {
        CredentialField::ALL
            .into_iter()
            .map(move |field| (field, self.get(field)))
    }

    /// Transform every present field, leaving absent fields untouched.
    ///
    /// Stops at the first error.
    pub fn try_map<E>(
        &self,
        mut f: impl FnMut(CredentialField, &str) -> Result<String, E>,
    ) -> Result<Self, E> {
        let mut out = CredentialFields::default();
        for (field, value) in self.iter() {
            if let Some(value) = value {
                out.set(field, Some(f(field, value)?));
            }
        }
        Ok(out)
    }

    /// Number of present fields.
    pub fn present_count(&self) -> usize {
        self.iter().filter(|(_, v)| v.is_some()).count()
    }

    fn slot(&self, field: CredentialField) -> &Option<String> {
        match field {
            CredentialField::Detail => &self.detail,
            CredentialField::AccessType => &self.access_type,
            CredentialField::Host => &self.host,
            CredentialField::Port => &self.port,
            CredentialField::Username => &self.username,
            CredentialField::Password => &self.password,
            CredentialField::Role => &self.role,
            CredentialField::Contents => &self.contents,
            CredentialField::InstanceType => &self.instance_type,
            CredentialField::PrivateIp => &self.private_ip,
            CredentialField::PublicIp => &self.public_ip,
        }
    }

    fn slot_mut(&mut self, field: CredentialField) -> &mut Option<String> {
        match field {
            CredentialField::Detail => &mut self.detail,
            CredentialField::AccessType => &mut self.access_type,
            CredentialField::Host => &mut self.host,
            CredentialField::Port => &mut self.port,
            CredentialField::Username => &mut self.username,
            CredentialField::Password => &mut self.password,
            CredentialField::Role => &mut self.role,
            CredentialField::Contents => &mut self.contents,
            CredentialField::InstanceType => &mut self.instance_type,
            CredentialField::PrivateIp => &mut self.private_ip,
            CredentialField::PublicIp => &mut self.public_ip,
        }
    }
}

/// A stored credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Stable identity.
    pub id: i64,
    /// Owning group.
    pub tab_id: i64,
    /// The eleven semantic fields.
    pub fields: CredentialFields,
    /// Optional highlight colour for the row.
    pub row_color: Option<String>,
    /// Position within the group; unique per group, gaps allowed.
    pub display_order: i64,
    /// Fields whose stored token could not be decrypted on this read.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreadable: Vec<CredentialField>,
}

/// A named group (tab) of credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: i64,
    pub name: String,
    pub color: String,
    /// Ordering key across all groups.
    pub position: i64,
}

/// Direction of an adjacent-swap move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MoveDirection {
    /// Towards lower order values (up in a list, left in a tab strip).
    #[strum(serialize = "up", serialize = "left")]
    Up,
    /// Towards higher order values (down in a list, right in a tab strip).
    #[strum(serialize = "down", serialize = "right")]
    Down,
}

/// What to do when a stored field fails to decrypt.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DecryptFailurePolicy {
    /// Return no value for the field and list it as unreadable.
    #[default]
    MarkUnreadable,
    /// Return the raw stored value, assuming legacy plaintext, and list the
    /// field as unreadable.
    LegacyPlaintext,
    /// Fail the whole read.
    Strict,
}

/// Colour theme persisted in the `theme` setting.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum Theme {
    #[default]
    Light,
    #[strum(serialize = "Semi-Dark")]
    #[serde(rename = "Semi-Dark")]
    SemiDark,
    Dark,
}

impl Theme {
    /// Themes in cycling order.
    pub const ALL: [Theme; 3] = [Theme::Light, Theme::SemiDark, Theme::Dark];

    /// The theme after this one, wrapping around.
    pub fn next(self) -> Theme {
        match self {
            Theme::Light => Theme::SemiDark,
            Theme::SemiDark => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn field_names_are_column_names() {
        assert_eq!(CredentialField::AccessType.as_ref(), "access_type");
        assert_eq!(CredentialField::PrivateIp.to_string(), "private_ip");
        assert_eq!(
            CredentialField::from_str("instance_type").unwrap(),
            CredentialField::InstanceType
        );
    }

    #[test]
    fn get_and_set_by_field() {
        let mut fields = CredentialFields::default();
        for field in CredentialField::ALL {
            fields.set(field, Some(field.to_string()));
        }
        for field in CredentialField::ALL {
            assert_eq!(fields.get(field), Some(field.as_ref()));
        }
        assert_eq!(fields.present_count(), 11);
    }

    #[test]
    fn try_map_skips_absent_fields() {
        let fields = CredentialFields::default()
            .with(CredentialField::Host, "db.local")
            .with(CredentialField::Password, "hunter2");

        let mut seen = Vec::new();
        let mapped: CredentialFields = fields
            .try_map(|field, value| -> Result<String, ()> {
                seen.push(field);
                Ok(value.to_uppercase())
            })
            .unwrap();

        assert_eq!(seen, vec![CredentialField::Host, CredentialField::Password]);
        assert_eq!(mapped.host.as_deref(), Some("DB.LOCAL"));
        assert_eq!(mapped.password.as_deref(), Some("HUNTER2"));
        assert!(mapped.username.is_none());
    }

    #[test]
    fn try_map_stops_on_error() {
        let fields = CredentialFields::default()
            .with(CredentialField::Detail, "a")
            .with(CredentialField::Role, "b");
        let result = fields.try_map(|field, _| {
            if field == CredentialField::Role {
                Err("boom")
            } else {
                Ok(String::new())
            }
        });
        assert_eq!(result, Err("boom"));
    }

    #[test]
    fn move_direction_parses_aliases() {
        assert_eq!(MoveDirection::from_str("left").unwrap(), MoveDirection::Up);
        assert_eq!(MoveDirection::from_str("down").unwrap(), MoveDirection::Down);
        assert_eq!(MoveDirection::from_str("right").unwrap(), MoveDirection::Down);
    }

    #[test]
    fn theme_cycles_through_all() {
        let mut theme = Theme::Light;
        for expected in [Theme::SemiDark, Theme::Dark, Theme::Light] {
            theme = theme.next();
            assert_eq!(theme, expected);
        }
        assert_eq!(Theme::from_str("Semi-Dark").unwrap(), Theme::SemiDark);
        assert_eq!(Theme::SemiDark.to_string(), "Semi-Dark");
    }

    #[test]
    fn decrypt_policy_serde_names() {
        let json = serde_json::to_string(&DecryptFailurePolicy::LegacyPlaintext).unwrap();
        assert_eq!(json, "\"legacy-plaintext\"");
        assert_eq!(
            DecryptFailurePolicy::from_str("mark-unreadable").unwrap(),
            DecryptFailurePolicy::MarkUnreadable
        );
    }

    #[test]
    fn credential_serializes_without_empty_unreadable() {
        let cred = Credential {
            id: 1,
            tab_id: 1,
            fields: CredentialFields::default().with(CredentialField::Username, "root"),
            row_color: None,
            display_order: 1,
            unreadable: Vec::new(),
        };
        let json = serde_json::to_value(&cred).unwrap();
        assert!(json.get("unreadable").is_none());
        assert_eq!(json["fields"]["username"], "root");
    }
}
