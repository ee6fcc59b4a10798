// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message upserts, edits, and soft deletes.
//!
//! Messages are created once per `(id, instance_id)` and only mutated by
//! later events referencing the same key. Deletion is a flag; the raw
//! payload stays for audit.

use std::str::FromStr;

use rusqlite::params;

use wahook_core::WahookError;
use wahook_core::types::{Message, MessageKind};

use crate::database::Database;

/// Upsert a message keyed by `(id, instance_id)`.
///
/// Replays converge: content and flags are last-write-wins, except the
/// edited/deleted flags which are sticky once set.
pub async fn upsert_message(db: &Database, message: &Message) -> Result<(), WahookError> {
    let m = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, instance_id, chat_jid, sender_jid, from_me,
                                       kind, content, timestamp, quoted_message_id,
                                       is_edited, is_forwarded, is_starred, is_deleted,
                                       raw_payload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT (id, instance_id) DO UPDATE SET
                     content = excluded.content,
                     kind = excluded.kind,
                     quoted_message_id = COALESCE(excluded.quoted_message_id, quoted_message_id),
                     is_edited = max(messages.is_edited, excluded.is_edited),
                     is_forwarded = excluded.is_forwarded,
                     is_starred = excluded.is_starred,
                     is_deleted = max(messages.is_deleted, excluded.is_deleted),
                     raw_payload = excluded.raw_payload,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    m.id,
                    m.instance_id,
                    m.chat_jid,
                    m.sender_jid,
                    m.from_me,
                    m.kind.to_string(),
                    m.content,
                    m.timestamp,
                    m.quoted_message_id,
                    m.is_edited,
                    m.is_forwarded,
                    m.is_starred,
                    m.is_deleted,
                    m.raw_payload,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a message by natural key.
pub async fn get_message(
    db: &Database,
    id: &str,
    instance_id: &str,
) -> Result<Option<Message>, WahookError> {
    let id = id.to_string();
    let instance_id = instance_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, instance_id, chat_jid, sender_jid, from_me, kind, content,
                        timestamp, quoted_message_id, is_edited, is_forwarded,
                        is_starred, is_deleted, raw_payload
                 FROM messages WHERE id = ?1 AND instance_id = ?2",
                params![id, instance_id],
                |row| {
                    let kind_text: String = row.get(5)?;
                    Ok(Message {
                        id: row.get(0)?,
                        instance_id: row.get(1)?,
                        chat_jid: row.get(2)?,
                        sender_jid: row.get(3)?,
                        from_me: row.get(4)?,
                        kind: MessageKind::from_str(&kind_text).map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(
                                5,
                                rusqlite::types::Type::Text,
                                Box::new(e),
                            )
                        })?,
                        content: row.get(6)?,
                        timestamp: row.get(7)?,
                        quoted_message_id: row.get(8)?,
                        is_edited: row.get(9)?,
                        is_forwarded: row.get(10)?,
                        is_starred: row.get(11)?,
                        is_deleted: row.get(12)?,
                        raw_payload: row.get(13)?,
                    })
                },
            );
            match result {
                Ok(message) => Ok(Some(message)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Replace content and set the edited flag. Returns false when the
/// message is unknown.
pub async fn mark_message_edited(
    db: &Database,
    id: &str,
    instance_id: &str,
    content: &str,
) -> Result<bool, WahookError> {
    let id = id.to_string();
    let instance_id = instance_id.to_string();
    let content = content.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE messages SET content = ?3, is_edited = 1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND instance_id = ?2",
                params![id, instance_id, content],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Soft-delete. Returns false when the message is unknown.
pub async fn mark_message_deleted(
    db: &Database,
    id: &str,
    instance_id: &str,
) -> Result<bool, WahookError> {
    let id = id.to_string();
    let instance_id = instance_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE messages SET is_deleted = 1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND instance_id = ?2",
                params![id, instance_id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
