// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Tsundoku source registry.
//!
//! Hosts, sources, capabilities, tags and presets live in one database with
//! embedded migrations. All access goes through a single `tokio-rusqlite`
//! connection, and every committed write bumps a change counter that the
//! registry observer listens to.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::{InsertOutcome, NewHost, NewPreset, NewSource};
