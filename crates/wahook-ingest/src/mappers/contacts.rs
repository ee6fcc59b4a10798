// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact record mapping.

use serde_json::Value;

use wahook_core::types::Contact;
use wahook_core::WahookError;

use crate::shape::pluck_str;

pub fn map_contact_record(instance_id: &str, record: &Value) -> Result<Contact, WahookError> {
    let jid = pluck_str(record, &["id", "remoteJid", "jid"])
        .ok_or_else(|| WahookError::MalformedPayload {
            event: "contacts.upsert".into(),
            message: "record has no id".into(),
        })?
        .to_string();
    let display_name = pluck_str(record, &["pushName", "name", "notify"]).map(str::to_string);
    let verified_name = pluck_str(record, &["verifiedName"]).map(str::to_string);
    let avatar_url = pluck_str(record, &["profilePicUrl", "profilePictureUrl"]).map(str::to_string);

    Ok(Contact {
        jid,
        instance_id: instance_id.to_string(),
        display_name,
        verified_name,
        avatar_url,
        is_business: record
            .get("isBusiness")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        is_blocked: false,
        is_self: false,
    })
}
