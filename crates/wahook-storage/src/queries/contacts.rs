// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact upserts.
//!
//! Contacts are never deleted. Optional fields only overwrite when the
//! incoming value is present, so a placeholder upsert cannot blank out a
//! previously learned display name.

use rusqlite::params;

use wahook_core::WahookError;
use wahook_core::types::Contact;

use crate::database::Database;

/// Upsert a contact keyed by `(jid, instance_id)`.
pub async fn upsert_contact(db: &Database, contact: &Contact) -> Result<(), WahookError> {
    let c = contact.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO contacts (jid, instance_id, display_name, verified_name,
                                       avatar_url, is_business, is_blocked, is_self)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (jid, instance_id) DO UPDATE SET
                     display_name = COALESCE(excluded.display_name, display_name),
                     verified_name = COALESCE(excluded.verified_name, verified_name),
                     avatar_url = COALESCE(excluded.avatar_url, avatar_url),
                     is_business = excluded.is_business,
                     is_blocked = excluded.is_blocked,
                     is_self = excluded.is_self,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    c.jid,
                    c.instance_id,
                    c.display_name,
                    c.verified_name,
                    c.avatar_url,
                    c.is_business,
                    c.is_blocked,
                    c.is_self,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a contact by natural key.
pub async fn get_contact(
    db: &Database,
    jid: &str,
    instance_id: &str,
) -> Result<Option<Contact>, WahookError> {
    let jid = jid.to_string();
    let instance_id = instance_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT jid, instance_id, display_name, verified_name, avatar_url,
                        is_business, is_blocked, is_self
                 FROM contacts WHERE jid = ?1 AND instance_id = ?2",
                params![jid, instance_id],
                |row| {
                    Ok(Contact {
                        jid: row.get(0)?,
                        instance_id: row.get(1)?,
                        display_name: row.get(2)?,
                        verified_name: row.get(3)?,
                        avatar_url: row.get(4)?,
                        is_business: row.get(5)?,
                        is_blocked: row.get(6)?,
                        is_self: row.get(7)?,
                    })
                },
            );
            match result {
                Ok(contact) => Ok(Some(contact)),
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
    async fn upsert_then_get_round_trips() {
        let (db, _dir) = setup_db().await;

        let mut contact = Contact::placeholder("555@c.us", "inst-1");
        contact.display_name = Some("Alice".into());
        upsert_contact(&db, &contact).await.unwrap();

        let found = get_contact(&db, "555@c.us", "inst-1").await.unwrap().unwrap();
        assert_eq!(found.display_name.as_deref(), Some("Alice"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn placeholder_upsert_keeps_known_name() {
        let (db, _dir) = setup_db().await;

        let mut named = Contact::placeholder("555@c.us", "inst-1");
        named.display_name = Some("Alice".into());
        upsert_contact(&db, &named).await.unwrap();

        // A later placeholder (name-less) upsert must not blank the name.
        let placeholder = Contact::placeholder("555@c.us", "inst-1");
        upsert_contact(&db, &placeholder).await.unwrap();

        let found = get_contact(&db, "555@c.us", "inst-1").await.unwrap().unwrap();
        assert_eq!(found.display_name.as_deref(), Some("Alice"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn replay_is_idempotent() {
        let (db, _dir) = setup_db().await;

        let mut contact = Contact::placeholder("555@c.us", "inst-1");
        contact.display_name = Some("Alice".into());
        upsert_contact(&db, &contact).await.unwrap();
        upsert_contact(&db, &contact).await.unwrap();

        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn same_jid_different_instance_is_distinct() {
        let (db, _dir) = setup_db().await;

        upsert_contact(&db, &Contact::placeholder("555@c.us", "inst-1"))
            .await
            .unwrap();
        upsert_contact(&db, &Contact::placeholder("555@c.us", "inst-2"))
            .await
            .unwrap();

        assert!(get_contact(&db, "555@c.us", "inst-1").await.unwrap().is_some());
        assert!(get_contact(&db, "555@c.us", "inst-2").await.unwrap().is_some());
        db.close().await.unwrap();
    }
}
