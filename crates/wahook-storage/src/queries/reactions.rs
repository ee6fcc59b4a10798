// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reaction upserts. The latest reaction from the same reactor replaces
//! the prior one.

use rusqlite::params;

use wahook_core::WahookError;
use wahook_core::types::Reaction;

use crate::database::Database;

/// Upsert a reaction keyed by `(message_id, instance_id, reactor_jid)`.
pub async fn upsert_reaction(db: &Database, reaction: &Reaction) -> Result<(), WahookError> {
    let r = reaction.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO reactions (message_id, instance_id, reactor_jid, emoji,
                                        from_me, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (message_id, instance_id, reactor_jid) DO UPDATE SET
                     emoji = excluded.emoji,
                     from_me = excluded.from_me,
                     timestamp = excluded.timestamp",
                params![
                    r.message_id,
                    r.instance_id,
                    r.reactor_jid,
                    r.emoji,
                    r.from_me,
                    r.timestamp,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All reactions on one message.
pub async fn get_reactions_for_message(
    db: &Database,
    message_id: &str,
    instance_id: &str,
) -> Result<Vec<Reaction>, WahookError> {
    let message_id = message_id.to_string();
    let instance_id = instance_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id, instance_id, reactor_jid, emoji, from_me, timestamp
                 FROM reactions WHERE message_id = ?1 AND instance_id = ?2
                 ORDER BY reactor_jid ASC",
            )?;
            let rows = stmt.query_map(params![message_id, instance_id], |row| {
                Ok(Reaction {
                    message_id: row.get(0)?,
                    instance_id: row.get(1)?,
                    reactor_jid: row.get(2)?,
                    emoji: row.get(3)?,
                    from_me: row.get(4)?,
                    timestamp: row.get(5)?,
                })
            })?;
            let mut reactions = Vec::new();
            for row in rows {
                reactions.push(row?);
            }
            Ok(reactions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
