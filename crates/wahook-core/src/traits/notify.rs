// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification fan-out contract.
//!
//! Implemented by an external push mechanism; consumed fire-and-forget by
//! the normalizer and the rule engine. Implementations log their own
//! failures and never propagate them into the event path.

use async_trait::async_trait;

use crate::types::{Message, Reaction};

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify_new_message(&self, message: &Message);

    async fn notify_new_reaction(&self, reaction: &Reaction);

    async fn notify_new_task(&self, task: &serde_json::Value);
}

/// A notifier that drops everything. Useful when no push mechanism is
/// configured.
#[derive(Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify_new_message(&self, _message: &Message) {}

    async fn notify_new_reaction(&self, _reaction: &Reaction) {}

    async fn notify_new_task(&self, _task: &serde_json::Value) {}
}
