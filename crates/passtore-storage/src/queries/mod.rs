// SPDX-FileCopyrightText: 2026 Passtore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.
//!
//! Field values pass through unchanged: encryption happens in the layers above.

pub mod credentials;
pub mod settings;
pub mod tabs;
