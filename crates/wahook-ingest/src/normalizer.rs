// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The event normalizer.
//!
//! Converts one raw webhook delivery into zero or more canonical records
//! and persists them in dependency order: a message is never written
//! before its sender contact, chat contact, chat row, and (for groups)
//! group row all exist. Every write is an idempotent upsert, so replaying
//! a delivery converges to the same rows.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use wahook_core::event::{EventType, RawEvent};
use wahook_core::time::now_rfc3339;
use wahook_core::types::{
    Chat, ChatKind, Contact, Group, Message, Reaction, StatusUpdate, Trigger, TriggerType,
};
use wahook_core::{Notifier, StoreGateway, WahookError};

use crate::mappers::calls::map_call_record;
use crate::mappers::chats::map_chat_record;
use crate::mappers::contacts::map_contact_record;
use crate::mappers::groups::{map_group_record, map_participants_record};
use crate::mappers::messages::{edited_content, map_message_record, MappedMessage};
use crate::shape::{detect_records, pluck, pluck_str};
use crate::status::map_status;

/// What one delivery produced: how many canonical records were persisted
/// and which triggers the rule engine should evaluate.
#[derive(Debug, Default)]
pub struct NormalizedOutcome {
    pub persisted: usize,
    pub triggers: Vec<Trigger>,
}

/// Stateless orchestrator over the store gateway and the notifier.
pub struct Normalizer<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
}

impl<S, N> Normalizer<S, N>
where
    S: StoreGateway,
    N: Notifier,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    /// Normalize and persist one raw delivery.
    ///
    /// Unknown event types are logged and ignored. Known events whose
    /// payload yields no structurally valid record fail with a malformed
    /// payload error, which the recovery queue captures.
    pub async fn process(&self, raw: &RawEvent) -> Result<NormalizedOutcome, WahookError> {
        let Some(event_type) = raw.event_type() else {
            tracing::debug!(event = %raw.event, instance = %raw.instance_id, "ignoring unknown event type");
            return Ok(NormalizedOutcome::default());
        };

        match event_type {
            EventType::MessagesUpsert => self.process_messages(raw).await,
            EventType::MessagesUpdate => self.process_message_updates(raw).await,
            EventType::MessagesEdit => self.process_message_edits(raw).await,
            EventType::MessagesDelete => self.process_message_deletes(raw).await,
            EventType::ContactsUpsert => self.process_contacts(raw).await,
            EventType::ChatsUpsert => self.process_chats(raw).await,
            EventType::GroupsUpsert | EventType::GroupsUpdate => self.process_groups(raw).await,
            EventType::GroupParticipantsUpdate => self.process_participants(raw).await,
            EventType::Call => self.process_call(raw).await,
        }
    }

    fn records_or_malformed(
        &self,
        raw: &RawEvent,
        array_field: Option<&str>,
        identity_paths: &[&str],
    ) -> Result<Vec<Value>, WahookError> {
        let records = detect_records(&raw.payload, array_field, identity_paths);
        if records.is_empty() {
            return Err(WahookError::MalformedPayload {
                event: raw.event.clone(),
                message: "no shape yielded a record with an identity field".into(),
            });
        }
        Ok(records)
    }

    async fn process_messages(&self, raw: &RawEvent) -> Result<NormalizedOutcome, WahookError> {
        let records = self.records_or_malformed(raw, Some("messages"), &["key.id"])?;
        let mut outcome = NormalizedOutcome::default();

        for record in &records {
            match map_message_record(&raw.instance_id, record)? {
                MappedMessage::Reaction(reaction) => {
                    self.persist_reaction(&reaction, &mut outcome).await?;
                }
                MappedMessage::Message {
                    message,
                    sender_display_name,
                } => {
                    self.persist_message(&message, sender_display_name, &mut outcome)
                        .await?;
                }
            }
        }
        Ok(outcome)
    }

    /// Upsert the reaction after its reactor contact exists.
    async fn persist_reaction(
        &self,
        reaction: &Reaction,
        outcome: &mut NormalizedOutcome,
    ) -> Result<(), WahookError> {
        self.store
            .upsert_contact(&Contact::placeholder(
                &reaction.reactor_jid,
                &reaction.instance_id,
            ))
            .await
            .map_err(dep("contact"))?;
        self.store
            .upsert_reaction(reaction)
            .await
            .map_err(persist("reaction"))?;
        outcome.persisted += 1;

        self.notifier.notify_new_reaction(reaction).await;

        let mut context = HashMap::new();
        context.insert("messageId".into(), reaction.message_id.clone());
        context.insert("reaction".into(), reaction.emoji.clone());
        context.insert("sender".into(), reaction.reactor_jid.clone());
        context.insert("instanceId".into(), reaction.instance_id.clone());
        context.insert("triggerType".into(), TriggerType::ReactionAdded.to_string());
        outcome.triggers.push(Trigger {
            trigger_type: TriggerType::ReactionAdded,
            value: reaction.emoji.clone(),
            instance_id: reaction.instance_id.clone(),
            actor_jid: Some(reaction.reactor_jid.clone()),
            context,
        });
        Ok(())
    }

    /// The dependency chain: sender contact, chat contact, chat row,
    /// group row when applicable, then the message itself.
    async fn persist_message(
        &self,
        message: &Message,
        sender_display_name: Option<String>,
        outcome: &mut NormalizedOutcome,
    ) -> Result<(), WahookError> {
        let mut sender = Contact::placeholder(&message.sender_jid, &message.instance_id);
        sender.display_name = sender_display_name;
        self.store
            .upsert_contact(&sender)
            .await
            .map_err(dep("sender contact"))?;

        self.store
            .upsert_contact(&Contact::placeholder(
                &message.chat_jid,
                &message.instance_id,
            ))
            .await
            .map_err(dep("chat contact"))?;

        let mut chat = Chat::new(&message.chat_jid, &message.instance_id);
        chat.last_activity_at = Some(message.timestamp.clone());
        self.store.upsert_chat(&chat).await.map_err(dep("chat"))?;

        if chat.kind == ChatKind::Group {
            let existing = self
                .store
                .get_group(&message.chat_jid, &message.instance_id)
                .await
                .map_err(dep("group"))?;
            if existing.is_none() {
                self.store
                    .upsert_group(
                        &Group::placeholder(&message.chat_jid, &message.instance_id),
                        false,
                    )
                    .await
                    .map_err(dep("group"))?;
            }
        }

        self.store
            .upsert_message(message)
            .await
            .map_err(persist("message"))?;
        outcome.persisted += 1;

        self.notifier.notify_new_message(message).await;

        let mut context = HashMap::new();
        context.insert("messageId".into(), message.id.clone());
        context.insert("chatId".into(), message.chat_jid.clone());
        context.insert("sender".into(), message.sender_jid.clone());
        context.insert("instanceId".into(), message.instance_id.clone());
        context.insert("fromMe".into(), message.from_me.to_string());
        context.insert("messageType".into(), message.kind.to_string());
        if let Some(content) = &message.content {
            context.insert("content".into(), content.clone());
        }

        let mut received_ctx = context.clone();
        received_ctx.insert(
            "triggerType".into(),
            TriggerType::MessageReceived.to_string(),
        );
        outcome.triggers.push(Trigger {
            trigger_type: TriggerType::MessageReceived,
            value: message.content.clone().unwrap_or_default(),
            instance_id: message.instance_id.clone(),
            actor_jid: Some(message.sender_jid.clone()),
            context: received_ctx,
        });

        // Keyword rules only make sense when there is text to match.
        if let Some(content) = &message.content {
            if !content.is_empty() {
                let mut keyword_ctx = context;
                keyword_ctx
                    .insert("triggerType".into(), TriggerType::KeywordMatch.to_string());
                outcome.triggers.push(Trigger {
                    trigger_type: TriggerType::KeywordMatch,
                    value: content.clone(),
                    instance_id: message.instance_id.clone(),
                    actor_jid: Some(message.sender_jid.clone()),
                    context: keyword_ctx,
                });
            }
        }
        Ok(())
    }

    async fn process_message_updates(
        &self,
        raw: &RawEvent,
    ) -> Result<NormalizedOutcome, WahookError> {
        let records = self.records_or_malformed(raw, Some("messages"), &["key.id", "keyId"])?;
        let mut outcome = NormalizedOutcome::default();

        for record in &records {
            // An update carrying a reaction sub-object routes to reaction
            // handling, same as an upsert.
            if pluck(record, "message.reactionMessage").is_some() {
                if let MappedMessage::Reaction(reaction) =
                    map_message_record(&raw.instance_id, record)?
                {
                    self.persist_reaction(&reaction, &mut outcome).await?;
                }
                continue;
            }

            let Some(message_id) = pluck_str(record, &["key.id", "keyId"]) else {
                continue;
            };
            let raw_status = pluck(record, "update.status")
                .or_else(|| record.get("status"))
                .cloned()
                .unwrap_or(Value::Null);
            match map_status(&raw_status) {
                Some(status) => {
                    self.store
                        .create_status_update(&StatusUpdate {
                            message_id: message_id.to_string(),
                            instance_id: raw.instance_id.clone(),
                            status,
                            timestamp: now_rfc3339(),
                        })
                        .await
                        .map_err(persist("status_update"))?;
                    outcome.persisted += 1;
                }
                None => {
                    tracing::warn!(
                        message_id,
                        status = %raw_status,
                        "dropping update with unmapped status code"
                    );
                }
            }
        }
        Ok(outcome)
    }

    async fn process_message_edits(
        &self,
        raw: &RawEvent,
    ) -> Result<NormalizedOutcome, WahookError> {
        let records = self.records_or_malformed(raw, Some("messages"), &["key.id", "keyId"])?;
        let mut outcome = NormalizedOutcome::default();

        for record in &records {
            let Some(message_id) = pluck_str(record, &["key.id", "keyId"]) else {
                continue;
            };
            let Some(content) = edited_content(record) else {
                tracing::warn!(message_id, "edit record carries no replacement text");
                continue;
            };
            let applied = self
                .store
                .mark_message_edited(message_id, &raw.instance_id, &content)
                .await
                .map_err(persist("message"))?;
            if applied {
                outcome.persisted += 1;
            } else {
                tracing::warn!(message_id, "edit for a message never seen");
            }
        }
        Ok(outcome)
    }

    async fn process_message_deletes(
        &self,
        raw: &RawEvent,
    ) -> Result<NormalizedOutcome, WahookError> {
        let records = self.records_or_malformed(raw, Some("messages"), &["key.id", "keyId", "id"])?;
        let mut outcome = NormalizedOutcome::default();

        for record in &records {
            let Some(message_id) = pluck_str(record, &["key.id", "keyId", "id"]) else {
                continue;
            };
            let applied = self
                .store
                .mark_message_deleted(message_id, &raw.instance_id)
                .await
                .map_err(persist("message"))?;
            if applied {
                outcome.persisted += 1;
            } else {
                tracing::debug!(message_id, "delete for a message never seen");
            }
        }
        Ok(outcome)
    }

    async fn process_contacts(&self, raw: &RawEvent) -> Result<NormalizedOutcome, WahookError> {
        let records = self.records_or_malformed(raw, None, &["id", "remoteJid", "jid"])?;
        let mut outcome = NormalizedOutcome::default();

        for record in &records {
            let contact = map_contact_record(&raw.instance_id, record)?;
            self.store
                .upsert_contact(&contact)
                .await
                .map_err(persist("contact"))?;
            outcome.persisted += 1;

            // A display name for a group JID may fill a placeholder
            // subject, but never displaces a real one.
            if ChatKind::from_jid(&contact.jid) == ChatKind::Group {
                if let Some(name) = &contact.display_name {
                    let mut group = Group::placeholder(&contact.jid, &contact.instance_id);
                    group.subject = name.clone();
                    self.store
                        .upsert_group(&group, false)
                        .await
                        .map_err(persist("group"))?;
                }
            }
        }
        Ok(outcome)
    }

    async fn process_chats(&self, raw: &RawEvent) -> Result<NormalizedOutcome, WahookError> {
        let records = self.records_or_malformed(raw, None, &["id", "remoteJid", "jid"])?;
        let mut outcome = NormalizedOutcome::default();

        for record in &records {
            let mapped = map_chat_record(&raw.instance_id, record)?;
            self.store
                .upsert_contact(&Contact::placeholder(
                    &mapped.chat.jid,
                    &mapped.chat.instance_id,
                ))
                .await
                .map_err(dep("chat contact"))?;
            self.store
                .upsert_chat(&mapped.chat)
                .await
                .map_err(persist("chat"))?;
            outcome.persisted += 1;

            if mapped.chat.kind == ChatKind::Group {
                let mut group = Group::placeholder(&mapped.chat.jid, &mapped.chat.instance_id);
                if let Some(name) = mapped.incidental_name {
                    group.subject = name;
                }
                self.store
                    .upsert_group(&group, false)
                    .await
                    .map_err(persist("group"))?;
            }
        }
        Ok(outcome)
    }

    async fn process_groups(&self, raw: &RawEvent) -> Result<NormalizedOutcome, WahookError> {
        let records = self.records_or_malformed(raw, None, &["id", "remoteJid", "jid"])?;
        let mut outcome = NormalizedOutcome::default();

        for record in &records {
            let group = map_group_record(&raw.instance_id, record)?;
            self.store
                .upsert_contact(&Contact::placeholder(&group.jid, &group.instance_id))
                .await
                .map_err(dep("group contact"))?;
            self.store
                .upsert_chat(&Chat::new(&group.jid, &group.instance_id))
                .await
                .map_err(dep("chat"))?;
            // A dedicated group event is authoritative for the subject.
            self.store
                .upsert_group(&group, true)
                .await
                .map_err(persist("group"))?;
            outcome.persisted += 1;
        }
        Ok(outcome)
    }

    async fn process_participants(
        &self,
        raw: &RawEvent,
    ) -> Result<NormalizedOutcome, WahookError> {
        let records = self.records_or_malformed(raw, None, &["id", "remoteJid", "jid"])?;
        let mut outcome = NormalizedOutcome::default();

        for record in &records {
            let update = map_participants_record(record)?;
            self.store
                .upsert_contact(&Contact::placeholder(&update.group_jid, &raw.instance_id))
                .await
                .map_err(dep("group contact"))?;
            self.store
                .upsert_chat(&Chat::new(&update.group_jid, &raw.instance_id))
                .await
                .map_err(dep("chat"))?;
            let existing = self
                .store
                .get_group(&update.group_jid, &raw.instance_id)
                .await
                .map_err(dep("group"))?;
            if existing.is_none() {
                self.store
                    .upsert_group(
                        &Group::placeholder(&update.group_jid, &raw.instance_id),
                        false,
                    )
                    .await
                    .map_err(dep("group"))?;
            }
            for jid in &update.participants {
                self.store
                    .upsert_contact(&Contact::placeholder(jid, &raw.instance_id))
                    .await
                    .map_err(persist("contact"))?;
                outcome.persisted += 1;
            }
            tracing::debug!(
                group = %update.group_jid,
                action = %update.action,
                count = update.participants.len(),
                "applied participant update"
            );
        }
        Ok(outcome)
    }

    async fn process_call(&self, raw: &RawEvent) -> Result<NormalizedOutcome, WahookError> {
        let records = self.records_or_malformed(raw, None, &["id", "callId"])?;
        let mut outcome = NormalizedOutcome::default();

        for record in &records {
            let call = map_call_record(&raw.instance_id, record)?;
            self.store
                .upsert_contact(&Contact::placeholder(&call.caller_jid, &call.instance_id))
                .await
                .map_err(dep("caller contact"))?;
            self.store
                .upsert_call_log(&call)
                .await
                .map_err(persist("call_log"))?;
            outcome.persisted += 1;
        }
        Ok(outcome)
    }
}

fn dep(entity: &'static str) -> impl FnOnce(WahookError) -> WahookError {
    move |e| WahookError::DependencyResolution {
        entity: entity.to_string(),
        source: Box::new(e),
    }
}

fn persist(entity: &'static str) -> impl FnOnce(WahookError) -> WahookError {
    move |e| WahookError::Persistence {
        entity: entity.to_string(),
        source: Box::new(e),
    }
}
