// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat record mapping.

use serde_json::Value;

use wahook_core::types::{Chat, ChatKind};
use wahook_core::WahookError;

use crate::shape::pluck_str;

/// A mapped chat plus any incidental display name the record carried.
/// The name is only ever used to fill a placeholder group subject; it is
/// never authoritative.
pub struct MappedChat {
    pub chat: Chat,
    pub incidental_name: Option<String>,
}

pub fn map_chat_record(instance_id: &str, record: &Value) -> Result<MappedChat, WahookError> {
    let jid = pluck_str(record, &["id", "remoteJid", "jid"])
        .ok_or_else(|| WahookError::MalformedPayload {
            event: "chats.upsert".into(),
            message: "record has no id".into(),
        })?
        .to_string();
    let unread_count = record
        .get("unreadCount")
        .or_else(|| record.get("unreadMessages"))
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let muted = record
        .get("muteExpiration")
        .and_then(Value::as_i64)
        .unwrap_or(0)
        > 0;
    let incidental_name = pluck_str(record, &["name", "pushName"]).map(str::to_string);

    let kind = ChatKind::from_jid(&jid);
    Ok(MappedChat {
        chat: Chat {
            jid,
            instance_id: instance_id.to_string(),
            kind,
            unread_count,
            archived: record
                .get("archived")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            pinned: record
                .get("pinned")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            muted,
            last_activity_at: None,
        },
        incidental_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn derives_kind_and_counters() {
        let record = json!({
            "id": "123@g.us",
            "unreadCount": 4,
            "archived": true,
            "name": "Team Alpha"
        });
        let mapped = map_chat_record("inst-1", &record).unwrap();
        assert_eq!(mapped.chat.kind, ChatKind::Group);
        assert_eq!(mapped.chat.unread_count, 4);
        assert!(mapped.chat.archived);
        assert_eq!(mapped.incidental_name.as_deref(), Some("Team Alpha"));
    }

    #[test]
    fn mute_expiration_sets_the_flag() {
        let record = json!({"id": "555@c.us", "muteExpiration": 1_900_000_000});
        let mapped = map_chat_record("inst-1", &record).unwrap();
        assert!(mapped.chat.muted);
        assert_eq!(mapped.chat.kind, ChatKind::Individual);
    }
}
