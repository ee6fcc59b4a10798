// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store gateway contract consumed by the normalizer, the recovery
//! sweeper, and the rule engine.
//!
//! Every write is an idempotent upsert keyed by natural identity or a
//! pure append; replaying the same event converges to the same rows.

use async_trait::async_trait;

use crate::error::WahookError;
use crate::types::{
    ActionRule, CallLog, Chat, Contact, Group, HealthStatus, Message, Reaction, RuleExecution,
    StatusUpdate, TriggerType,
};

#[async_trait]
pub trait StoreGateway: Send + Sync + 'static {
    /// Cheap liveness probe; gates recovery sweeps.
    async fn health_check(&self) -> Result<HealthStatus, WahookError>;

    // --- Canonical entity upserts (idempotent, natural-key) ---

    async fn upsert_contact(&self, contact: &Contact) -> Result<(), WahookError>;

    async fn upsert_chat(&self, chat: &Chat) -> Result<(), WahookError>;

    /// Upsert group metadata. `authoritative` marks a dedicated group
    /// event whose subject always wins; non-authoritative upserts never
    /// overwrite an existing non-placeholder subject.
    async fn upsert_group(&self, group: &Group, authoritative: bool) -> Result<(), WahookError>;

    async fn get_group(&self, jid: &str, instance_id: &str)
    -> Result<Option<Group>, WahookError>;

    async fn upsert_message(&self, message: &Message) -> Result<(), WahookError>;

    async fn get_message(
        &self,
        id: &str,
        instance_id: &str,
    ) -> Result<Option<Message>, WahookError>;

    /// Apply an edit: replace content, set the edited flag. Returns false
    /// if the message is unknown.
    async fn mark_message_edited(
        &self,
        id: &str,
        instance_id: &str,
        content: &str,
    ) -> Result<bool, WahookError>;

    /// Soft-delete: the row is kept for audit, flagged deleted.
    async fn mark_message_deleted(&self, id: &str, instance_id: &str)
    -> Result<bool, WahookError>;

    /// Latest reaction per (message, reactor) wins.
    async fn upsert_reaction(&self, reaction: &Reaction) -> Result<(), WahookError>;

    /// Append-only status log.
    async fn create_status_update(&self, update: &StatusUpdate) -> Result<(), WahookError>;

    async fn upsert_call_log(&self, call: &CallLog) -> Result<(), WahookError>;

    // --- Rule engine reads/appends ---

    /// Active rules for a trigger type, with conditions and actions loaded.
    async fn rules_by_trigger(
        &self,
        trigger_type: TriggerType,
    ) -> Result<Vec<ActionRule>, WahookError>;

    async fn save_rule_execution(&self, execution: &RuleExecution) -> Result<(), WahookError>;

    /// Number of executions recorded for this rule since the current UTC
    /// midnight, regardless of status. Skipped and failed runs consume
    /// daily-cap slots too.
    async fn execution_count_today(&self, rule_id: i64) -> Result<i64, WahookError>;

    /// Bump `last_executed_at` and the lifetime execution counter.
    async fn touch_rule_execution(
        &self,
        rule_id: i64,
        executed_at: &str,
    ) -> Result<(), WahookError>;
}
