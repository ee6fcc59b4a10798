// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message record mapping, including the reaction special case.

use serde_json::Value;

use wahook_core::time::{epoch_to_rfc3339, now_rfc3339};
use wahook_core::types::{Message, MessageKind, Reaction};
use wahook_core::WahookError;

use crate::shape::{pluck, pluck_str};

/// Outcome of mapping one raw message record. A message whose inner
/// payload carries a reaction sub-object routes to reaction handling;
/// reaction detection takes priority over generic message handling.
#[derive(Debug)]
pub enum MappedMessage {
    Message {
        message: Message,
        sender_display_name: Option<String>,
    },
    Reaction(Reaction),
}

/// Map one raw message record into a canonical message or reaction.
pub fn map_message_record(
    instance_id: &str,
    record: &Value,
) -> Result<MappedMessage, WahookError> {
    let id = pluck_str(record, &["key.id"])
        .ok_or_else(|| WahookError::MalformedPayload {
            event: "messages.upsert".into(),
            message: "record has no key.id".into(),
        })?
        .to_string();
    let chat_jid = pluck_str(record, &["key.remoteJid"])
        .ok_or_else(|| WahookError::MalformedPayload {
            event: "messages.upsert".into(),
            message: format!("record {id} has no key.remoteJid"),
        })?
        .to_string();
    let from_me = pluck(record, "key.fromMe")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    // Group messages carry the actual sender in key.participant; direct
    // chats identify the sender by the chat JID itself.
    let sender_jid = pluck_str(record, &["key.participant"])
        .unwrap_or(&chat_jid)
        .to_string();
    let sender_display_name = record
        .get("pushName")
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(reaction) = pluck(record, "message.reactionMessage") {
        return Ok(MappedMessage::Reaction(map_reaction(
            instance_id,
            &id,
            &sender_jid,
            from_me,
            reaction,
        )));
    }

    let (kind, content) = classify(record.get("message"));
    let timestamp = epoch_value(record.get("messageTimestamp"))
        .map(|secs| epoch_to_rfc3339(secs, false))
        .unwrap_or_else(now_rfc3339);
    let quoted_message_id = pluck_str(
        record,
        &[
            "message.extendedTextMessage.contextInfo.stanzaId",
            "contextInfo.stanzaId",
        ],
    )
    .map(str::to_string);
    let is_forwarded = pluck(record, "message.extendedTextMessage.contextInfo.isForwarded")
        .and_then(Value::as_bool)
        .unwrap_or(false)
        || pluck(record, "message.extendedTextMessage.contextInfo.forwardingScore")
            .and_then(Value::as_i64)
            .unwrap_or(0)
            > 0;

    Ok(MappedMessage::Message {
        message: Message {
            id,
            instance_id: instance_id.to_string(),
            chat_jid,
            sender_jid,
            from_me,
            kind,
            content,
            timestamp,
            quoted_message_id,
            is_edited: false,
            is_forwarded,
            is_starred: false,
            is_deleted: false,
            raw_payload: record.to_string(),
        },
        sender_display_name,
    })
}

fn map_reaction(
    instance_id: &str,
    own_id: &str,
    sender_jid: &str,
    from_me: bool,
    reaction: &Value,
) -> Reaction {
    // The reaction targets the message named in its inner key, falling
    // back to the carrying record's own id.
    let message_id = pluck_str(reaction, &["key.id"]).unwrap_or(own_id).to_string();
    let emoji = reaction
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let timestamp = epoch_value(reaction.get("senderTimestampMs"))
        .map(|ms| epoch_to_rfc3339(ms, true))
        .unwrap_or_else(now_rfc3339);

    Reaction {
        message_id,
        instance_id: instance_id.to_string(),
        reactor_jid: sender_jid.to_string(),
        emoji,
        from_me,
        timestamp,
    }
}

/// Classify the inner message object into a kind plus extracted content.
fn classify(message: Option<&Value>) -> (MessageKind, Option<String>) {
    let Some(message) = message else {
        return (MessageKind::Unsupported, None);
    };
    if let Some(text) = message.get("conversation").and_then(Value::as_str) {
        return (MessageKind::Text, Some(text.to_string()));
    }
    if let Some(text) = pluck_str(message, &["extendedTextMessage.text"]) {
        return (MessageKind::Text, Some(text.to_string()));
    }
    if let Some(image) = message.get("imageMessage") {
        let caption = image.get("caption").and_then(Value::as_str);
        return (MessageKind::Image, caption.map(str::to_string));
    }
    if let Some(video) = message.get("videoMessage") {
        let caption = video.get("caption").and_then(Value::as_str);
        return (MessageKind::Video, caption.map(str::to_string));
    }
    if message.get("audioMessage").is_some() {
        return (MessageKind::Audio, None);
    }
    if let Some(doc) = message.get("documentMessage") {
        let name = doc.get("fileName").and_then(Value::as_str);
        return (MessageKind::Document, name.map(str::to_string));
    }
    if message.get("stickerMessage").is_some() {
        return (MessageKind::Sticker, None);
    }
    if let Some(location) = message.get("locationMessage") {
        let lat = location.get("degreesLatitude").and_then(Value::as_f64);
        let lng = location.get("degreesLongitude").and_then(Value::as_f64);
        let content = match (lat, lng) {
            (Some(lat), Some(lng)) => Some(format!("{lat},{lng}")),
            _ => None,
        };
        return (MessageKind::Location, content);
    }
    if let Some(card) = message.get("contactMessage") {
        let name = card.get("displayName").and_then(Value::as_str);
        return (MessageKind::ContactCard, name.map(str::to_string));
    }
    (MessageKind::Unsupported, None)
}

/// Epoch values arrive as numbers or numeric strings.
pub fn epoch_value(raw: Option<&Value>) -> Option<i64> {
    let raw = raw?;
    raw.as_i64()
        .or_else(|| raw.as_str().and_then(|s| s.parse().ok()))
}

/// New content of an edit record, probing the shapes the provider uses
/// for `messages.edit`.
pub fn edited_content(record: &Value) -> Option<String> {
    pluck_str(
        record,
        &[
            "message.editedMessage.message.protocolMessage.editedMessage.conversation",
            "message.protocolMessage.editedMessage.conversation",
            "message.editedMessage.conversation",
            "message.conversation",
            "text",
        ],
    )
    .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_message_maps() {
        let record = json!({
            "key": {"id": "A1", "remoteJid": "123@g.us", "fromMe": false, "participant": "555@c.us"},
            "pushName": "Alice",
            "message": {"conversation": "hi"},
            "messageTimestamp": 1_700_000_000
        });
        match map_message_record("inst-1", &record).unwrap() {
            MappedMessage::Message {
                message,
                sender_display_name,
            } => {
                assert_eq!(message.id, "A1");
                assert_eq!(message.chat_jid, "123@g.us");
                assert_eq!(message.sender_jid, "555@c.us");
                assert_eq!(message.kind, MessageKind::Text);
                assert_eq!(message.content.as_deref(), Some("hi"));
                assert!(message.timestamp.starts_with("2023-11-14T"));
                assert_eq!(sender_display_name.as_deref(), Some("Alice"));
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn direct_chat_sender_is_the_chat_jid() {
        let record = json!({
            "key": {"id": "B1", "remoteJid": "555@c.us", "fromMe": false},
            "message": {"conversation": "hey"}
        });
        match map_message_record("inst-1", &record).unwrap() {
            MappedMessage::Message { message, .. } => {
                assert_eq!(message.sender_jid, "555@c.us");
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn reaction_takes_priority_over_message_handling() {
        let record = json!({
            "key": {"id": "R1", "remoteJid": "123@g.us", "participant": "555@c.us"},
            "message": {"reactionMessage": {
                "key": {"id": "A1"},
                "text": "👍",
                "senderTimestampMs": 1_700_000_000_000_i64
            }}
        });
        match map_message_record("inst-1", &record).unwrap() {
            MappedMessage::Reaction(reaction) => {
                assert_eq!(reaction.message_id, "A1");
                assert_eq!(reaction.reactor_jid, "555@c.us");
                assert_eq!(reaction.emoji, "👍");
                assert!(reaction.timestamp.starts_with("2023-11-14T"));
            }
            other => panic!("expected reaction, got {other:?}"),
        }
    }

    #[test]
    fn implausible_reaction_timestamp_falls_back_to_receipt_time() {
        let record = json!({
            "key": {"id": "R1", "remoteJid": "555@c.us"},
            "message": {"reactionMessage": {
                "key": {"id": "A1"},
                "text": "❤️",
                "senderTimestampMs": 99
            }}
        });
        match map_message_record("inst-1", &record).unwrap() {
            MappedMessage::Reaction(reaction) => {
                let year: i32 = reaction.timestamp[..4].parse().unwrap();
                assert!(year >= 2026, "got {}", reaction.timestamp);
            }
            other => panic!("expected reaction, got {other:?}"),
        }
    }

    #[test]
    fn media_kinds_extract_captions() {
        let record = json!({
            "key": {"id": "I1", "remoteJid": "555@c.us"},
            "message": {"imageMessage": {"caption": "look"}}
        });
        match map_message_record("inst-1", &record).unwrap() {
            MappedMessage::Message { message, .. } => {
                assert_eq!(message.kind, MessageKind::Image);
                assert_eq!(message.content.as_deref(), Some("look"));
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_inner_message_is_unsupported() {
        let record = json!({
            "key": {"id": "U1", "remoteJid": "555@c.us"},
            "message": {"pollCreationMessage": {"name": "lunch?"}}
        });
        match map_message_record("inst-1", &record).unwrap() {
            MappedMessage::Message { message, .. } => {
                assert_eq!(message.kind, MessageKind::Unsupported);
                assert!(message.content.is_none());
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn missing_key_id_is_a_malformed_payload() {
        let record = json!({"message": {"conversation": "hi"}});
        let err = map_message_record("inst-1", &record).unwrap_err();
        assert!(matches!(err, WahookError::MalformedPayload { .. }));
    }

    #[test]
    fn string_epoch_values_parse() {
        assert_eq!(epoch_value(Some(&json!("1700000000"))), Some(1_700_000_000));
        assert_eq!(epoch_value(Some(&json!(1_700_000_000))), Some(1_700_000_000));
        assert_eq!(epoch_value(Some(&json!("junk"))), None);
    }
}
