// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Wahook ingestion engine.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and typed
//! natural-key upsert operations for every canonical entity. The
//! [`SqliteStore`] implements the `StoreGateway` trait consumed by the
//! normalizer, the recovery sweeper, and the rule engine.

pub mod database;
pub mod gateway;
pub mod migrations;
pub mod queries;

pub use database::Database;
pub use gateway::SqliteStore;
