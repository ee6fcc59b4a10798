// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Group metadata upserts with subject authority.
//!
//! Subject text from a dedicated group event always wins. Subject-like
//! text arriving incidentally (contact or chat events) may only fill in
//! the "New Group" placeholder, never replace a real subject.

use rusqlite::params;

use wahook_core::WahookError;
use wahook_core::types::{Group, PLACEHOLDER_SUBJECT};

use crate::database::Database;

/// Upsert group metadata keyed by `(jid, instance_id)`.
pub async fn upsert_group(
    db: &Database,
    group: &Group,
    authoritative: bool,
) -> Result<(), WahookError> {
    let g = group.clone();
    db.connection()
        .call(move |conn| {
            if authoritative {
                conn.execute(
                    "INSERT INTO chat_groups (jid, instance_id, subject, description,
                                              owner_jid, locked, group_created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT (jid, instance_id) DO UPDATE SET
                         subject = excluded.subject,
                         description = COALESCE(excluded.description, description),
                         owner_jid = COALESCE(excluded.owner_jid, owner_jid),
                         locked = excluded.locked,
                         group_created_at = COALESCE(excluded.group_created_at, group_created_at),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                    params![
                        g.jid,
                        g.instance_id,
                        g.subject,
                        g.description,
                        g.owner_jid,
                        g.locked,
                        g.created_at,
                    ],
                )?;
            } else {
                conn.execute(
                    "INSERT INTO chat_groups (jid, instance_id, subject, description,
                                              owner_jid, locked, group_created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT (jid, instance_id) DO UPDATE SET
                         subject = CASE
                             WHEN chat_groups.subject = ?8 THEN excluded.subject
                             ELSE chat_groups.subject
                         END,
                         description = COALESCE(excluded.description, description),
                         owner_jid = COALESCE(excluded.owner_jid, owner_jid),
                         group_created_at = COALESCE(excluded.group_created_at, group_created_at),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                    params![
                        g.jid,
                        g.instance_id,
                        g.subject,
                        g.description,
                        g.owner_jid,
                        g.locked,
                        g.created_at,
                        PLACEHOLDER_SUBJECT,
                    ],
                )?;
            }
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up group metadata by natural key.
pub async fn get_group(
    db: &Database,
    jid: &str,
    instance_id: &str,
) -> Result<Option<Group>, WahookError> {
    let jid = jid.to_string();
    let instance_id = instance_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT jid, instance_id, subject, description, owner_jid, locked,
                        group_created_at
                 FROM chat_groups WHERE jid = ?1 AND instance_id = ?2",
                params![jid, instance_id],
                |row| {
                    Ok(Group {
                        jid: row.get(0)?,
                        instance_id: row.get(1)?,
                        subject: row.get(2)?,
                        description: row.get(3)?,
                        owner_jid: row.get(4)?,
                        locked: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                },
            );
            match result {
                Ok(group) => Ok(Some(group)),
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

    fn group(jid: &str, subject: &str) -> Group {
        Group {
            jid: jid.into(),
            instance_id: "inst-1".into(),
            subject: subject.into(),
            description: None,
            owner_jid: None,
            locked: false,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn authoritative_subject_always_wins() {
        let (db, _dir) = setup_db().await;

        upsert_group(&db, &group("1@g.us", "Team Alpha"), true)
            .await
            .unwrap();
        upsert_group(&db, &group("1@g.us", "Team Alpha v2"), true)
            .await
            .unwrap();

        let found = get_group(&db, "1@g.us", "inst-1").await.unwrap().unwrap();
        assert_eq!(found.subject, "Team Alpha v2");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn incidental_subject_cannot_replace_real_subject() {
        let (db, _dir) = setup_db().await;

        upsert_group(&db, &group("1@g.us", "Team Alpha"), true)
            .await
            .unwrap();
        // A contact's pushName leaking through a non-authoritative path.
        upsert_group(&db, &group("1@g.us", "Bob"), false)
            .await
            .unwrap();

        let found = get_group(&db, "1@g.us", "inst-1").await.unwrap().unwrap();
        assert_eq!(found.subject, "Team Alpha");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn incidental_subject_fills_placeholder() {
        let (db, _dir) = setup_db().await;

        upsert_group(&db, &Group::placeholder("1@g.us", "inst-1"), false)
            .await
            .unwrap();
        upsert_group(&db, &group("1@g.us", "Weekend Plans"), false)
            .await
            .unwrap();

        let found = get_group(&db, "1@g.us", "inst-1").await.unwrap().unwrap();
        assert_eq!(found.subject, "Weekend Plans");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn placeholder_never_replaces_real_subject() {
        let (db, _dir) = setup_db().await;

        upsert_group(&db, &group("1@g.us", "Team Alpha"), true)
            .await
            .unwrap();
        upsert_group(&db, &Group::placeholder("1@g.us", "inst-1"), false)
            .await
            .unwrap();

        let found = get_group(&db, "1@g.us", "inst-1").await.unwrap().unwrap();
        assert_eq!(found.subject, "Team Alpha");
        db.close().await.unwrap();
    }
}
