// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Wahook webhook ingestion engine.
//!
//! This crate provides the canonical domain model, the closed event-type
//! enum, the error taxonomy, and the trait seams (store gateway,
//! notification fan-out, action sinks) shared by every Wahook crate.

pub mod error;
pub mod event;
pub mod time;
pub mod traits;
pub mod types;

pub use error::WahookError;
pub use event::{EventType, RawEvent};
pub use traits::{ActionSink, Notifier, StoreGateway};
pub use types::HealthStatus;
