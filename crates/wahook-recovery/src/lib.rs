// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failure capture, retry, and dead-lettering.
//!
//! The guarantee: a transient failure in normalization or persistence
//! never loses an event. Failed deliveries land in a file-based journal,
//! a periodic sweeper replays them (after structural repair) under a
//! monotone backoff schedule, and records that exhaust their retries
//! move to a dead-letter partition for manual inspection.

pub mod journal;
pub mod sanitize;
pub mod sweeper;

pub use journal::FailureJournal;
pub use sweeper::{SweepStats, Sweeper};
