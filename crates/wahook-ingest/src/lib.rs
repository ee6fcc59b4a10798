// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event normalization for the Wahook ingestion engine.
//!
//! Takes raw webhook deliveries, detects which of the provider's nesting
//! shapes the payload uses, maps each record into the canonical model,
//! and persists everything in dependency order through the store gateway.
//! Outputs the triggers the rule engine evaluates.

pub mod mappers;
pub mod normalizer;
pub mod shape;
pub mod status;

pub use normalizer::{NormalizedOutcome, Normalizer};
