// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite tenant store for Seatbot.
//!
//! Holds tenant configuration documents plus the account and client rows that
//! seat inventory is computed from. Access is single-writer through
//! `tokio-rusqlite`, with migrations embedded via refinery.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteTenantStore;
pub use database::Database;
