// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation rules: matching, template substitution, and execution.
//!
//! Triggers produced by the normalizer are evaluated against stored
//! rules; matching rules run their actions through the side-effect sink
//! (or directly over HTTP for `webhook_call`), under per-rule cooldown
//! and daily-cap limits, with every outcome recorded in an append-only
//! execution audit.

pub mod engine;
pub mod matcher;
pub mod sink;
pub mod template;

pub use engine::RuleEngine;
pub use sink::LoggingSink;
