// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call event mapping.

use serde_json::Value;

use wahook_core::time::{epoch_to_rfc3339, now_rfc3339};
use wahook_core::types::CallLog;
use wahook_core::WahookError;

use crate::mappers::messages::epoch_value;
use crate::shape::pluck_str;

pub fn map_call_record(instance_id: &str, record: &Value) -> Result<CallLog, WahookError> {
    let call_id = pluck_str(record, &["id", "callId"])
        .ok_or_else(|| WahookError::MalformedPayload {
            event: "call".into(),
            message: "record has no call id".into(),
        })?
        .to_string();
    let caller_jid = pluck_str(record, &["from", "chatId", "remoteJid"])
        .ok_or_else(|| WahookError::MalformedPayload {
            event: "call".into(),
            message: format!("call {call_id} has no caller"),
        })?
        .to_string();
    let timestamp = epoch_value(record.get("date").or_else(|| record.get("timestamp")))
        .map(|secs| epoch_to_rfc3339(secs, false))
        .unwrap_or_else(now_rfc3339);

    Ok(CallLog {
        call_id,
        instance_id: instance_id.to_string(),
        caller_jid,
        is_video: record
            .get("isVideo")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        outcome: pluck_str(record, &["status", "outcome"])
            .unwrap_or("offer")
            .to_string(),
        timestamp,
    })
}
