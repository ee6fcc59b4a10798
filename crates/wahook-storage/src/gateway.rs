// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `StoreGateway` implementation backed by SQLite.

use async_trait::async_trait;

use wahook_core::traits::StoreGateway;
use wahook_core::types::{
    ActionRule, CallLog, Chat, Contact, Group, HealthStatus, Message, Reaction, RuleExecution,
    StatusUpdate, TriggerType,
};
use wahook_core::WahookError;

use crate::database::Database;
use crate::queries;

/// Thin adapter over [`Database`] delegating to the query modules.
/// Cloning is cheap; all clones share the single writer connection.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl StoreGateway for SqliteStore {
    async fn health_check(&self) -> Result<HealthStatus, WahookError> {
        let probe = self
            .db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT 1", [], |row| row.get(0))
            })
            .await;
        match probe {
            Ok(1) => Ok(HealthStatus::Healthy),
            Ok(other) => Ok(HealthStatus::Degraded(format!(
                "probe returned unexpected value {other}"
            ))),
            Err(e) => {
                tracing::warn!(error = %e, "storage health probe failed");
                Ok(HealthStatus::Unhealthy(e.to_string()))
            }
        }
    }

    async fn upsert_contact(&self, contact: &Contact) -> Result<(), WahookError> {
        queries::contacts::upsert_contact(&self.db, contact).await
    }

    async fn upsert_chat(&self, chat: &Chat) -> Result<(), WahookError> {
        queries::chats::upsert_chat(&self.db, chat).await
    }

    async fn upsert_group(&self, group: &Group, authoritative: bool) -> Result<(), WahookError> {
        queries::groups::upsert_group(&self.db, group, authoritative).await
    }

    async fn get_group(
        &self,
        jid: &str,
        instance_id: &str,
    ) -> Result<Option<Group>, WahookError> {
        queries::groups::get_group(&self.db, jid, instance_id).await
    }

    async fn upsert_message(&self, message: &Message) -> Result<(), WahookError> {
        queries::messages::upsert_message(&self.db, message).await
    }

    async fn get_message(
        &self,
        id: &str,
        instance_id: &str,
    ) -> Result<Option<Message>, WahookError> {
        queries::messages::get_message(&self.db, id, instance_id).await
    }

    async fn mark_message_edited(
        &self,
        id: &str,
        instance_id: &str,
        content: &str,
    ) -> Result<bool, WahookError> {
        queries::messages::mark_message_edited(&self.db, id, instance_id, content).await
    }

    async fn mark_message_deleted(
        &self,
        id: &str,
        instance_id: &str,
    ) -> Result<bool, WahookError> {
        queries::messages::mark_message_deleted(&self.db, id, instance_id).await
    }

    async fn upsert_reaction(&self, reaction: &Reaction) -> Result<(), WahookError> {
        queries::reactions::upsert_reaction(&self.db, reaction).await
    }

    async fn create_status_update(&self, update: &StatusUpdate) -> Result<(), WahookError> {
        queries::status_updates::create_status_update(&self.db, update).await
    }

    async fn upsert_call_log(&self, call: &CallLog) -> Result<(), WahookError> {
        queries::calls::upsert_call_log(&self.db, call).await
    }

    async fn rules_by_trigger(
        &self,
        trigger_type: TriggerType,
    ) -> Result<Vec<ActionRule>, WahookError> {
        queries::rules::rules_by_trigger(&self.db, trigger_type).await
    }

    async fn save_rule_execution(&self, execution: &RuleExecution) -> Result<(), WahookError> {
        queries::rules::save_rule_execution(&self.db, execution).await
    }

    async fn execution_count_today(&self, rule_id: i64) -> Result<i64, WahookError> {
        queries::rules::execution_count_today(&self.db, rule_id).await
    }

    async fn touch_rule_execution(
        &self,
        rule_id: i64,
        executed_at: &str,
    ) -> Result<(), WahookError> {
        queries::rules::touch_rule_execution(&self.db, rule_id, executed_at).await
    }
}
