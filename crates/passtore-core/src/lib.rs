// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Passtore credential store.
//!
//! This crate provides the error type and the domain types shared by the
//! vault, storage, and CLI crates.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PasstoreError;
pub use types::{
    Credential, CredentialField, CredentialFields, DecryptFailurePolicy, MoveDirection, Tab,
    Theme,
};
