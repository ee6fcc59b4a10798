// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical domain model shared by all Wahook crates.
//!
//! These are the normalized records produced by the event normalizer and
//! consumed by the store gateway and the rule engine. Identity is always
//! the provider-assigned id plus the instance id; every persistence
//! operation on these types is an idempotent upsert on that natural key.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Subject used when a group row must exist before a dedicated group
/// event has arrived. Never overwrites a real subject.
pub const PLACEHOLDER_SUBJECT: &str = "New Group";

/// Health status reported by the store gateway's probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

/// Chat classification, derived deterministically from the JID suffix.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    Individual,
    Group,
}

impl ChatKind {
    /// Group JIDs end in `@g.us`; everything else is an individual chat.
    pub fn from_jid(jid: &str) -> Self {
        if jid.ends_with("@g.us") {
            ChatKind::Group
        } else {
            ChatKind::Individual
        }
    }
}

/// A contact, upserted whenever referenced by any other entity.
/// Never deleted; mutable fields are last-write-wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub jid: String,
    pub instance_id: String,
    pub display_name: Option<String>,
    pub verified_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_business: bool,
    pub is_blocked: bool,
    pub is_self: bool,
}

impl Contact {
    /// A minimal contact row carrying only identity. Used when an entity
    /// references a JID the store has never seen.
    pub fn placeholder(jid: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            jid: jid.into(),
            instance_id: instance_id.into(),
            display_name: None,
            verified_name: None,
            avatar_url: None,
            is_business: false,
            is_blocked: false,
            is_self: false,
        }
    }
}

/// A chat thread (individual or group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub jid: String,
    pub instance_id: String,
    pub kind: ChatKind,
    pub unread_count: i64,
    pub archived: bool,
    pub pinned: bool,
    pub muted: bool,
    pub last_activity_at: Option<String>,
}

impl Chat {
    pub fn new(jid: impl Into<String>, instance_id: impl Into<String>) -> Self {
        let jid = jid.into();
        let kind = ChatKind::from_jid(&jid);
        Self {
            jid,
            instance_id: instance_id.into(),
            kind,
            unread_count: 0,
            archived: false,
            pinned: false,
            muted: false,
            last_activity_at: None,
        }
    }
}

/// Group metadata. A group row exists for every group chat before any
/// message referencing that chat is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub jid: String,
    pub instance_id: String,
    pub subject: String,
    pub description: Option<String>,
    pub owner_jid: Option<String>,
    pub locked: bool,
    pub created_at: Option<String>,
}

impl Group {
    pub fn placeholder(jid: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            jid: jid.into(),
            instance_id: instance_id.into(),
            subject: PLACEHOLDER_SUBJECT.to_string(),
            description: None,
            owner_jid: None,
            locked: false,
            created_at: None,
        }
    }
}

/// Message content classification from the provider's inner message keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Image,
    Video,
    Audio,
    Document,
    Sticker,
    Location,
    ContactCard,
    Unsupported,
}

/// A normalized message. The original raw payload is retained for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub instance_id: String,
    pub chat_jid: String,
    pub sender_jid: String,
    pub from_me: bool,
    pub kind: MessageKind,
    pub content: Option<String>,
    pub timestamp: String,
    pub quoted_message_id: Option<String>,
    pub is_edited: bool,
    pub is_forwarded: bool,
    pub is_starred: bool,
    pub is_deleted: bool,
    pub raw_payload: String,
}

/// A reaction to a message. The latest reaction from the same reactor
/// replaces the prior one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub message_id: String,
    pub instance_id: String,
    pub reactor_jid: String,
    pub emoji: String,
    pub from_me: bool,
    pub timestamp: String,
}

/// Delivery status of a message, mapped from provider codes through a
/// fixed lookup table. Unknown codes are dropped, never stored unmapped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Played,
    Error,
}

/// Append-only status log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub message_id: String,
    pub instance_id: String,
    pub status: MessageStatus,
    pub timestamp: String,
}

/// A voice/video call record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallLog {
    pub call_id: String,
    pub instance_id: String,
    pub caller_jid: String,
    pub is_video: bool,
    pub outcome: String,
    pub timestamp: String,
}

/// A durable record of an event that failed normalization or persistence.
///
/// Journaled to the filesystem, outside the main store, so a store outage
/// does not also break recovery tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedEventRecord {
    pub id: String,
    pub timestamp: String,
    pub instance_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub sender: Option<String>,
    pub error: String,
    pub retry_count: u32,
    pub last_retry_at: Option<String>,
}

// --- Rule engine model ---

/// What kind of normalized occurrence a rule reacts to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    MessageReceived,
    ReactionAdded,
    KeywordMatch,
}

/// Who may fire a rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TriggerPermission {
    Anyone,
    Me,
    Users,
}

/// Comparison operator for a rule condition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    MatchesRegex,
    GreaterThan,
    LessThan,
    InList,
}

/// How conditions sharing a group index combine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupOperator {
    And,
    Or,
}

/// One condition attached to a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub kind: String,
    pub operator: ConditionOperator,
    pub field_name: String,
    pub value: String,
    pub group_index: i64,
    pub group_operator: GroupOperator,
    pub negated: bool,
}

/// Side effect a rule performs when it matches.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    CreateTask,
    CreateNote,
    CreateFinancialRecord,
    CreateCalendarEvent,
    SendMessage,
    AddLabel,
    WebhookCall,
}

/// One ordered action attached to a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAction {
    pub action_type: ActionType,
    pub order: i64,
    pub target_entity_id: Option<String>,
    pub parameters: serde_json::Value,
    pub template_id: Option<String>,
    pub conditional: bool,
    pub condition_expression: Option<String>,
}

/// A stored automation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRule {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub trigger_type: TriggerType,
    pub trigger_permission: TriggerPermission,
    pub allowed_users: Vec<String>,
    pub priority: i64,
    pub creator_jid: Option<String>,
    pub conditions: Vec<RuleCondition>,
    pub actions: Vec<RuleAction>,
    pub cooldown_minutes: i64,
    /// 0 means no daily cap.
    pub max_executions_per_day: i64,
    pub last_executed_at: Option<String>,
    pub execution_count: i64,
    pub created_at: String,
}

/// Outcome of a rule execution, recorded in the audit log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Failed,
    Partial,
    Skipped,
}

/// Append-only audit row written once per matched rule per trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleExecution {
    pub rule_id: i64,
    pub trigger_snapshot: serde_json::Value,
    pub status: ExecutionStatus,
    pub error_message: Option<String>,
    pub actions_executed: i64,
    pub actions_failed: i64,
    pub duration_ms: i64,
    pub executed_at: String,
}

/// A normalized occurrence handed to the rule engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub trigger_type: TriggerType,
    pub value: String,
    pub instance_id: String,
    /// JID of the actor that caused the trigger, for permission checks.
    pub actor_jid: Option<String>,
    /// Flat field map conditions and templates evaluate against.
    pub context: HashMap<String, String>,
}

impl Trigger {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.context.get(name).map(String::as_str)
    }
}
