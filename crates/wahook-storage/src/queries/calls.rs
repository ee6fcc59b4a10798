// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call log upserts.

use rusqlite::params;

use wahook_core::WahookError;
use wahook_core::types::CallLog;

use crate::database::Database;

/// Upsert a call record keyed by `(call_id, instance_id)`. A later event
/// for the same call (accept after offer) overwrites the outcome.
pub async fn upsert_call_log(db: &Database, call: &CallLog) -> Result<(), WahookError> {
    let c = call.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO call_logs (call_id, instance_id, caller_jid, is_video,
                                        outcome, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (call_id, instance_id) DO UPDATE SET
                     outcome = excluded.outcome,
                     is_video = excluded.is_video,
                     timestamp = excluded.timestamp",
                params![
                    c.call_id,
                    c.instance_id,
                    c.caller_jid,
                    c.is_video,
                    c.outcome,
                    c.timestamp,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a call record by natural key.
pub async fn get_call_log(
    db: &Database,
    call_id: &str,
    instance_id: &str,
) -> Result<Option<CallLog>, WahookError> {
    let call_id = call_id.to_string();
    let instance_id = instance_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT call_id, instance_id, caller_jid, is_video, outcome, timestamp
                 FROM call_logs WHERE call_id = ?1 AND instance_id = ?2",
                params![call_id, instance_id],
                |row| {
                    Ok(CallLog {
                        call_id: row.get(0)?,
                        instance_id: row.get(1)?,
                        caller_jid: row.get(2)?,
                        is_video: row.get(3)?,
                        outcome: row.get(4)?,
                        timestamp: row.get(5)?,
                    })
                },
            );
            match result {
                Ok(call) => Ok(Some(call)),
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

    #[tokio::test]
    async fn call_outcome_converges_on_replay() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();

        let mut call = CallLog {
            call_id: "call-1".into(),
            instance_id: "inst-1".into(),
            caller_jid: "555@c.us".into(),
            is_video: false,
            outcome: "offer".into(),
            timestamp: "2026-01-01T00:00:00.000Z".into(),
        };
        upsert_call_log(&db, &call).await.unwrap();

        call.outcome = "timeout".into();
        upsert_call_log(&db, &call).await.unwrap();

        let found = get_call_log(&db, "call-1", "inst-1").await.unwrap().unwrap();
        assert_eq!(found.outcome, "timeout");
        db.close().await.unwrap();
    }
}
