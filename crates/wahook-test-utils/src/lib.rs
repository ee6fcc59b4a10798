// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory test doubles for the Wahook trait seams.
//!
//! [`MockStore`] is a full `StoreGateway` backed by maps and vectors, with
//! switchable write-failure injection for exercising the recovery path.
//! [`RecordingNotifier`] and [`RecordingActionSink`] capture what was
//! dispatched so tests can assert on it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use wahook_core::types::{
    ActionRule, ActionType, CallLog, Chat, Contact, Group, HealthStatus, Message,
    Reaction, RuleExecution, StatusUpdate, TriggerType, PLACEHOLDER_SUBJECT,
};
use wahook_core::{ActionSink, Notifier, StoreGateway, WahookError};

fn injected_failure(entity: &str) -> WahookError {
    WahookError::Persistence {
        entity: entity.to_string(),
        source: Box::new(std::io::Error::other("injected store failure")),
    }
}

/// In-memory `StoreGateway`. Keys mirror the natural keys of the SQLite
/// schema so upsert semantics match production.
#[derive(Default)]
pub struct MockStore {
    pub contacts: Mutex<HashMap<(String, String), Contact>>,
    pub chats: Mutex<HashMap<(String, String), Chat>>,
    pub groups: Mutex<HashMap<(String, String), Group>>,
    pub messages: Mutex<HashMap<(String, String), Message>>,
    pub reactions: Mutex<HashMap<(String, String, String), Reaction>>,
    pub status_updates: Mutex<Vec<StatusUpdate>>,
    pub call_logs: Mutex<HashMap<(String, String), CallLog>>,
    pub rules: Mutex<Vec<ActionRule>>,
    pub executions: Mutex<Vec<RuleExecution>>,
    fail_writes: AtomicBool,
    unhealthy: AtomicBool,
}

impl MockStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every write fail until [`heal`](Self::heal) is called.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Make the health probe report unhealthy.
    pub fn go_unhealthy(&self) {
        self.unhealthy.store(true, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.fail_writes.store(false, Ordering::SeqCst);
        self.unhealthy.store(false, Ordering::SeqCst);
    }

    pub fn seed_rule(&self, rule: ActionRule) {
        self.rules.lock().unwrap().push(rule);
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.lock().unwrap().len()
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    fn check_writable(&self, entity: &str) -> Result<(), WahookError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(injected_failure(entity))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StoreGateway for MockStore {
    async fn health_check(&self) -> Result<HealthStatus, WahookError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            Ok(HealthStatus::Unhealthy("injected outage".to_string()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn upsert_contact(&self, contact: &Contact) -> Result<(), WahookError> {
        self.check_writable("contact")?;
        let key = (contact.jid.clone(), contact.instance_id.clone());
        let mut contacts = self.contacts.lock().unwrap();
        match contacts.get_mut(&key) {
            // Placeholders never blank out known fields.
            Some(existing) => {
                if contact.display_name.is_some() {
                    existing.display_name = contact.display_name.clone();
                }
                if contact.verified_name.is_some() {
                    existing.verified_name = contact.verified_name.clone();
                }
                if contact.avatar_url.is_some() {
                    existing.avatar_url = contact.avatar_url.clone();
                }
                existing.is_business = contact.is_business;
                existing.is_blocked = contact.is_blocked;
                existing.is_self = contact.is_self;
            }
            None => {
                contacts.insert(key, contact.clone());
            }
        }
        Ok(())
    }

    async fn upsert_chat(&self, chat: &Chat) -> Result<(), WahookError> {
        self.check_writable("chat")?;
        let key = (chat.jid.clone(), chat.instance_id.clone());
        let mut chats = self.chats.lock().unwrap();
        match chats.get_mut(&key) {
            Some(existing) => {
                existing.unread_count = chat.unread_count;
                existing.archived = chat.archived;
                existing.pinned = chat.pinned;
                existing.muted = chat.muted;
                if chat.last_activity_at.is_some() {
                    existing.last_activity_at = chat.last_activity_at.clone();
                }
            }
            None => {
                chats.insert(key, chat.clone());
            }
        }
        Ok(())
    }

    async fn upsert_group(&self, group: &Group, authoritative: bool) -> Result<(), WahookError> {
        self.check_writable("group")?;
        let key = (group.jid.clone(), group.instance_id.clone());
        let mut groups = self.groups.lock().unwrap();
        match groups.get_mut(&key) {
            Some(existing) => {
                if authoritative || existing.subject == PLACEHOLDER_SUBJECT {
                    existing.subject = group.subject.clone();
                }
                if group.description.is_some() {
                    existing.description = group.description.clone();
                }
                if group.owner_jid.is_some() {
                    existing.owner_jid = group.owner_jid.clone();
                }
                existing.locked = group.locked;
            }
            None => {
                groups.insert(key, group.clone());
            }
        }
        Ok(())
    }

    async fn get_group(
        &self,
        jid: &str,
        instance_id: &str,
    ) -> Result<Option<Group>, WahookError> {
        let key = (jid.to_string(), instance_id.to_string());
        Ok(self.groups.lock().unwrap().get(&key).cloned())
    }

    async fn upsert_message(&self, message: &Message) -> Result<(), WahookError> {
        self.check_writable("message")?;
        let key = (message.id.clone(), message.instance_id.clone());
        let mut messages = self.messages.lock().unwrap();
        match messages.get_mut(&key) {
            Some(existing) => {
                existing.content = message.content.clone();
                existing.kind = message.kind;
                // Sticky flags survive a replay of the original event.
                existing.is_edited |= message.is_edited;
                existing.is_deleted |= message.is_deleted;
                existing.is_forwarded = message.is_forwarded;
                existing.is_starred = message.is_starred;
                existing.raw_payload = message.raw_payload.clone();
            }
            None => {
                messages.insert(key, message.clone());
            }
        }
        Ok(())
    }

    async fn get_message(
        &self,
        id: &str,
        instance_id: &str,
    ) -> Result<Option<Message>, WahookError> {
        let key = (id.to_string(), instance_id.to_string());
        Ok(self.messages.lock().unwrap().get(&key).cloned())
    }

    async fn mark_message_edited(
        &self,
        id: &str,
        instance_id: &str,
        content: &str,
    ) -> Result<bool, WahookError> {
        self.check_writable("message")?;
        let key = (id.to_string(), instance_id.to_string());
        let mut messages = self.messages.lock().unwrap();
        match messages.get_mut(&key) {
            Some(existing) => {
                existing.content = Some(content.to_string());
                existing.is_edited = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_message_deleted(
        &self,
        id: &str,
        instance_id: &str,
    ) -> Result<bool, WahookError> {
        self.check_writable("message")?;
        let key = (id.to_string(), instance_id.to_string());
        let mut messages = self.messages.lock().unwrap();
        match messages.get_mut(&key) {
            Some(existing) => {
                existing.is_deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn upsert_reaction(&self, reaction: &Reaction) -> Result<(), WahookError> {
        self.check_writable("reaction")?;
        let key = (
            reaction.message_id.clone(),
            reaction.instance_id.clone(),
            reaction.reactor_jid.clone(),
        );
        self.reactions.lock().unwrap().insert(key, reaction.clone());
        Ok(())
    }

    async fn create_status_update(&self, update: &StatusUpdate) -> Result<(), WahookError> {
        self.check_writable("status_update")?;
        self.status_updates.lock().unwrap().push(update.clone());
        Ok(())
    }

    async fn upsert_call_log(&self, call: &CallLog) -> Result<(), WahookError> {
        self.check_writable("call_log")?;
        let key = (call.call_id.clone(), call.instance_id.clone());
        self.call_logs.lock().unwrap().insert(key, call.clone());
        Ok(())
    }

    async fn rules_by_trigger(
        &self,
        trigger_type: TriggerType,
    ) -> Result<Vec<ActionRule>, WahookError> {
        Ok(self
            .rules
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_active && r.trigger_type == trigger_type)
            .cloned()
            .collect())
    }

    async fn save_rule_execution(&self, execution: &RuleExecution) -> Result<(), WahookError> {
        self.check_writable("rule_execution")?;
        self.executions.lock().unwrap().push(execution.clone());
        Ok(())
    }

    async fn execution_count_today(&self, rule_id: i64) -> Result<i64, WahookError> {
        // All mock executions count as today.
        Ok(self
            .executions
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.rule_id == rule_id)
            .count() as i64)
    }

    async fn touch_rule_execution(
        &self,
        rule_id: i64,
        executed_at: &str,
    ) -> Result<(), WahookError> {
        self.check_writable("rule")?;
        let mut rules = self.rules.lock().unwrap();
        if let Some(rule) = rules.iter_mut().find(|r| r.id == rule_id) {
            rule.last_executed_at = Some(executed_at.to_string());
            rule.execution_count += 1;
        }
        Ok(())
    }
}

/// Captures every notification for later assertion.
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<Message>>,
    pub reactions: Mutex<Vec<Reaction>>,
    pub tasks: Mutex<Vec<serde_json::Value>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_new_message(&self, message: &Message) {
        self.messages.lock().unwrap().push(message.clone());
    }

    async fn notify_new_reaction(&self, reaction: &Reaction) {
        self.reactions.lock().unwrap().push(reaction.clone());
    }

    async fn notify_new_task(&self, task: &serde_json::Value) {
        self.tasks.lock().unwrap().push(task.clone());
    }
}

/// Captures executed actions; optionally fails a named action type.
#[derive(Default)]
pub struct RecordingActionSink {
    pub executed: Mutex<Vec<(String, ActionType, serde_json::Value)>>,
    failing_action: Mutex<Option<ActionType>>,
}

impl RecordingActionSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_on(&self, action_type: ActionType) {
        *self.failing_action.lock().unwrap() = Some(action_type);
    }
}

#[async_trait]
impl ActionSink for RecordingActionSink {
    async fn execute(
        &self,
        instance_id: &str,
        action_type: ActionType,
        parameters: &serde_json::Value,
    ) -> Result<(), WahookError> {
        if *self.failing_action.lock().unwrap() == Some(action_type) {
            return Err(WahookError::ActionExecution {
                action: action_type.to_string(),
                message: "injected sink failure".to_string(),
            });
        }
        self.executed.lock().unwrap().push((
            instance_id.to_string(),
            action_type,
            parameters.clone(),
        ));
        Ok(())
    }
}
