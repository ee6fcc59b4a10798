// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only message status log.

use std::str::FromStr;

use rusqlite::params;

use wahook_core::WahookError;
use wahook_core::types::{MessageStatus, StatusUpdate};

use crate::database::Database;

/// Append one status entry. Never updates prior entries.
pub async fn create_status_update(db: &Database, update: &StatusUpdate) -> Result<(), WahookError> {
    let u = update.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO status_updates (message_id, instance_id, status, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
                params![u.message_id, u.instance_id, u.status.to_string(), u.timestamp],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Status history for one message, oldest first.
pub async fn get_status_updates_for_message(
    db: &Database,
    message_id: &str,
    instance_id: &str,
) -> Result<Vec<StatusUpdate>, WahookError> {
    let message_id = message_id.to_string();
    let instance_id = instance_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id, instance_id, status, timestamp
                 FROM status_updates WHERE message_id = ?1 AND instance_id = ?2
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![message_id, instance_id], |row| {
                let status_text: String = row.get(2)?;
                Ok(StatusUpdate {
                    message_id: row.get(0)?,
                    instance_id: row.get(1)?,
                    status: MessageStatus::from_str(&status_text).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            2,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?,
                    timestamp: row.get(3)?,
                })
            })?;
            let mut updates = Vec::new();
            for row in rows {
                updates.push(row?);
            }
            Ok(updates)
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
    async fn log_is_append_only_and_ordered() {
        let (db, _dir) = setup_db().await;

        for (status, ts) in [
            (MessageStatus::Sent, "2026-01-01T00:00:01.000Z"),
            (MessageStatus::Delivered, "2026-01-01T00:00:02.000Z"),
            (MessageStatus::Read, "2026-01-01T00:00:03.000Z"),
        ] {
            create_status_update(
                &db,
                &StatusUpdate {
                    message_id: "A1".into(),
                    instance_id: "inst-1".into(),
                    status,
                    timestamp: ts.into(),
                },
            )
            .await
            .unwrap();
        }

        let updates = get_status_updates_for_message(&db, "A1", "inst-1")
            .await
            .unwrap();
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].status, MessageStatus::Sent);
        assert_eq!(updates[2].status, MessageStatus::Read);
        db.close().await.unwrap();
    }
}
