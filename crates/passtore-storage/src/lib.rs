// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Passtore credential store.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! connection via `tokio-rusqlite`, transactional reordering, the one-time
//! encryption migration, and the plaintext [`Session`] API used by UI and
//! export collaborators.

pub mod database;
pub mod encryption;
pub mod migrations;
pub mod ordering;
pub mod queries;
pub mod session;
pub mod store;

pub use database::{Database, DatabaseOptions};
pub use encryption::MigrationReport;
pub use session::{Session, SessionOptions};
pub use store::CredentialStore;
