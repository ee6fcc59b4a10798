// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat upserts.

use std::str::FromStr;

use rusqlite::params;

use wahook_core::WahookError;
use wahook_core::types::{Chat, ChatKind};

use crate::database::Database;

/// Upsert a chat keyed by `(jid, instance_id)`. Counters and flags are
/// last-write-wins; `last_activity_at` only moves when the incoming event
/// carries one.
pub async fn upsert_chat(db: &Database, chat: &Chat) -> Result<(), WahookError> {
    let c = chat.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO chats (jid, instance_id, kind, unread_count, archived,
                                    pinned, muted, last_activity_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (jid, instance_id) DO UPDATE SET
                     unread_count = excluded.unread_count,
                     archived = excluded.archived,
                     pinned = excluded.pinned,
                     muted = excluded.muted,
                     last_activity_at = COALESCE(excluded.last_activity_at, last_activity_at),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    c.jid,
                    c.instance_id,
                    c.kind.to_string(),
                    c.unread_count,
                    c.archived,
                    c.pinned,
                    c.muted,
                    c.last_activity_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a chat by natural key.
pub async fn get_chat(
    db: &Database,
    jid: &str,
    instance_id: &str,
) -> Result<Option<Chat>, WahookError> {
    let jid = jid.to_string();
    let instance_id = instance_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT jid, instance_id, kind, unread_count, archived, pinned,
                        muted, last_activity_at
                 FROM chats WHERE jid = ?1 AND instance_id = ?2",
                params![jid, instance_id],
                |row| {
                    let kind_text: String = row.get(2)?;
                    Ok(Chat {
                        jid: row.get(0)?,
                        instance_id: row.get(1)?,
                        kind: ChatKind::from_str(&kind_text).map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(
                                2,
                                rusqlite::types::Type::Text,
                                Box::new(e),
                            )
                        })?,
                        unread_count: row.get(3)?,
                        archived: row.get(4)?,
                        pinned: row.get(5)?,
                        muted: row.get(6)?,
                        last_activity_at: row.get(7)?,
                    })
                },
            );
            match result {
                Ok(chat) => Ok(Some(chat)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn kind_is_persisted_and_parsed() {
        let (db, _dir) = setup_db().await;

        upsert_chat(&db, &Chat::new("123456789@g.us", "inst-1"))
            .await
            .unwrap();
        let chat = get_chat(&db, "123456789@g.us", "inst-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chat.kind, ChatKind::Group);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn counters_are_last_write_wins() {
        let (db, _dir) = setup_db().await;

        let mut chat = Chat::new("555@c.us", "inst-1");
        chat.unread_count = 3;
        upsert_chat(&db, &chat).await.unwrap();

        chat.unread_count = 0;
        chat.archived = true;
        upsert_chat(&db, &chat).await.unwrap();

        let found = get_chat(&db, "555@c.us", "inst-1").await.unwrap().unwrap();
        assert_eq!(found.unread_count, 0);
        assert!(found.archived);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_activity_timestamp_does_not_regress() {
        let (db, _dir) = setup_db().await;

        let mut chat = Chat::new("555@c.us", "inst-1");
        chat.last_activity_at = Some("2026-01-02T00:00:00.000Z".into());
        upsert_chat(&db, &chat).await.unwrap();

        chat.last_activity_at = None;
        upsert_chat(&db, &chat).await.unwrap();

        let found = get_chat(&db, "555@c.us", "inst-1").await.unwrap().unwrap();
        assert_eq!(
            found.last_activity_at.as_deref(),
            Some("2026-01-02T00:00:00.000Z")
        );
        db.close().await.unwrap();
    }
}
