// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider status code mapping.
//!
//! `messages.update` carries delivery status either as a numeric code or a
//! screaming-snake label. Both forms map through this fixed table; codes
//! outside it are dropped by the caller, never stored unmapped.

use serde_json::Value;

use wahook_core::types::MessageStatus;

/// Map a raw provider status value. Returns `None` for unknown codes.
pub fn map_status(raw: &Value) -> Option<MessageStatus> {
    if let Some(code) = raw.as_i64() {
        return match code {
            0 => Some(MessageStatus::Error),
            1 => Some(MessageStatus::Pending),
            2 => Some(MessageStatus::Sent),
            3 => Some(MessageStatus::Delivered),
            4 => Some(MessageStatus::Read),
            5 => Some(MessageStatus::Played),
            _ => None,
        };
    }
    match raw.as_str()?.to_ascii_uppercase().as_str() {
        "ERROR" => Some(MessageStatus::Error),
        "PENDING" => Some(MessageStatus::Pending),
        "SERVER_ACK" => Some(MessageStatus::Sent),
        "DELIVERY_ACK" => Some(MessageStatus::Delivered),
        "READ" => Some(MessageStatus::Read),
        "PLAYED" => Some(MessageStatus::Played),
        _ => None,
    }
}
