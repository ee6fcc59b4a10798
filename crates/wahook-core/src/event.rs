// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event-type normalization at the ingress boundary.
//!
//! The upstream provider names the same logical event at least three ways:
//! dotted (`messages.upsert`), screaming snake (`MESSAGES_UPSERT`), and a
//! URL path segment (`messages-upsert`). All forms are folded into one
//! closed [`EventType`] enum here so downstream code matches exhaustively
//! on the tag instead of re-probing strings at each use site.

use serde::{Deserialize, Serialize};
use strum::Display;

/// The closed set of webhook event types Wahook understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum EventType {
    #[strum(serialize = "messages.upsert")]
    MessagesUpsert,
    #[strum(serialize = "messages.update")]
    MessagesUpdate,
    #[strum(serialize = "messages.edit")]
    MessagesEdit,
    #[strum(serialize = "messages.delete")]
    MessagesDelete,
    #[strum(serialize = "contacts.upsert")]
    ContactsUpsert,
    #[strum(serialize = "chats.upsert")]
    ChatsUpsert,
    #[strum(serialize = "groups.upsert")]
    GroupsUpsert,
    #[strum(serialize = "groups.update")]
    GroupsUpdate,
    #[strum(serialize = "group.participants.update")]
    GroupParticipantsUpdate,
    #[strum(serialize = "call")]
    Call,
}

impl EventType {
    /// Parse a raw provider event name, tolerating the dotted, uppercase,
    /// and path-segment spellings. Returns `None` for unknown events,
    /// which callers log and ignore (not an error).
    pub fn parse(raw: &str) -> Option<Self> {
        let folded: String = raw
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '-' || c == '_' { '.' } else { c })
            .collect();

        match folded.as_str() {
            "messages.upsert" => Some(Self::MessagesUpsert),
            "messages.update" => Some(Self::MessagesUpdate),
            "messages.edit" => Some(Self::MessagesEdit),
            "messages.delete" => Some(Self::MessagesDelete),
            "contacts.upsert" | "contacts.update" => Some(Self::ContactsUpsert),
            "chats.upsert" | "chats.update" => Some(Self::ChatsUpsert),
            "groups.upsert" => Some(Self::GroupsUpsert),
            "groups.update" => Some(Self::GroupsUpdate),
            "group.participants.update" => Some(Self::GroupParticipantsUpdate),
            "call" => Some(Self::Call),
            _ => None,
        }
    }
}

/// One raw webhook delivery as received at the ingress boundary.
///
/// `event` keeps the provider's original spelling for audit and for
/// journaling unknown types; `payload` is the untouched JSON body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub instance_id: String,
    pub event: String,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub sender: Option<String>,
}

impl RawEvent {
    pub fn new(
        instance_id: impl Into<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
        sender: Option<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            event: event.into(),
            payload,
            sender,
        }
    }

    /// The canonical event type, if this delivery names a known event.
    pub fn event_type(&self) -> Option<EventType> {
        EventType::parse(&self.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_provider_spellings() {
        assert_eq!(
            EventType::parse("messages.upsert"),
            Some(EventType::MessagesUpsert)
        );
        assert_eq!(
            EventType::parse("MESSAGES_UPSERT"),
            Some(EventType::MessagesUpsert)
        );
        assert_eq!(
            EventType::parse("messages-upsert"),
            Some(EventType::MessagesUpsert)
        );
        assert_eq!(
            EventType::parse("group-participants-update"),
            Some(EventType::GroupParticipantsUpdate)
        );
        assert_eq!(EventType::parse("CALL"), Some(EventType::Call));
    }

    #[test]
    fn unknown_events_are_none_not_errors() {
        assert_eq!(EventType::parse("presence.update"), None);
        assert_eq!(EventType::parse(""), None);
    }

    #[test]
    fn display_uses_dotted_form() {
        assert_eq!(EventType::MessagesUpsert.to_string(), "messages.upsert");
        assert_eq!(
            EventType::GroupParticipantsUpdate.to_string(),
            "group.participants.update"
        );
    }

    #[test]
    fn raw_event_resolves_its_type() {
        let ev = RawEvent::new(
            "inst-1",
            "CHATS_UPSERT",
            serde_json::json!({"id": "123@c.us"}),
            None,
        );
        assert_eq!(ev.event_type(), Some(EventType::ChatsUpsert));
    }
}
