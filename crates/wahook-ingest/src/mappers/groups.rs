// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Group metadata and participant-change mapping.

use serde_json::Value;

use wahook_core::time::epoch_to_rfc3339;
use wahook_core::types::{Group, PLACEHOLDER_SUBJECT};
use wahook_core::WahookError;

use crate::mappers::messages::epoch_value;
use crate::shape::pluck_str;

pub fn map_group_record(instance_id: &str, record: &Value) -> Result<Group, WahookError> {
    let jid = pluck_str(record, &["id", "remoteJid", "jid"])
        .ok_or_else(|| WahookError::MalformedPayload {
            event: "groups.upsert".into(),
            message: "record has no id".into(),
        })?
        .to_string();
    let subject = pluck_str(record, &["subject"])
        .unwrap_or(PLACEHOLDER_SUBJECT)
        .to_string();

    Ok(Group {
        jid,
        instance_id: instance_id.to_string(),
        subject,
        description: pluck_str(record, &["desc", "description"]).map(str::to_string),
        owner_jid: pluck_str(record, &["owner", "subjectOwner"]).map(str::to_string),
        locked: record
            .get("announce")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        created_at: epoch_value(record.get("creation")).map(|secs| epoch_to_rfc3339(secs, false)),
    })
}

/// A `group.participants.update` record: which group, which JIDs, and the
/// provider's action label (`add`, `remove`, `promote`, `demote`).
pub struct ParticipantsUpdate {
    pub group_jid: String,
    pub participants: Vec<String>,
    pub action: String,
}

pub fn map_participants_record(record: &Value) -> Result<ParticipantsUpdate, WahookError> {
    let group_jid = pluck_str(record, &["id", "remoteJid", "jid"])
        .ok_or_else(|| WahookError::MalformedPayload {
            event: "group.participants.update".into(),
            message: "record has no group id".into(),
        })?
        .to_string();
    let participants = record
        .get("participants")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let action = record
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    Ok(ParticipantsUpdate {
        group_jid,
        participants,
        action,
    })
}
