// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural payload repair, applied once per replay attempt.
//!
//! Fixes the two defects that dominate dead-letter volume: channel
//! identifiers missing their domain suffix, and message records missing
//! an id entirely. JID repair is heuristic on length (provider group ids
//! are long digit runs, individual ids are phone numbers); a missing
//! message id gets a synthetic `recovered-*` id so the record is never
//! rejected purely for a missing key.

use serde_json::Value;
use uuid::Uuid;

/// Digit-only phone numbers fit in 15 digits (E.164); anything longer is
/// a group identifier.
const MAX_INDIVIDUAL_DIGITS: usize = 15;

const JID_KEYS: [&str; 3] = ["remoteJid", "participant", "jid"];

/// Reconstruct a domain suffix for a bare digit-run identifier. Returns
/// `None` when the value is not repairable (already suffixed, empty, or
/// not digits).
pub fn repair_jid(raw: &str) -> Option<String> {
    if raw.is_empty() || raw.contains('@') || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if raw.len() > MAX_INDIVIDUAL_DIGITS {
        Some(format!("{raw}@g.us"))
    } else {
        Some(format!("{raw}@c.us"))
    }
}

/// Return a repaired copy of the payload. The original is never mutated;
/// the sanitized copy is used only for the replay attempt.
pub fn sanitize(payload: &Value) -> Value {
    let mut out = payload.clone();
    walk(&mut out);
    out
}

fn walk(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if JID_KEYS.contains(&key.as_str()) {
                    if let Some(raw) = child.as_str() {
                        if let Some(fixed) = repair_jid(raw) {
                            *child = Value::String(fixed);
                        }
                    }
                }
                walk(child);
            }
            // A message key object without an id would be rejected by the
            // mapper; substitute a synthetic one.
            if let Some(Value::Object(key)) = map.get_mut("key") {
                let missing = match key.get("id") {
                    None | Some(Value::Null) => true,
                    Some(Value::String(s)) => s.is_empty(),
                    _ => false,
                };
                if missing {
                    key.insert(
                        "id".to_string(),
                        Value::String(format!("recovered-{}", Uuid::new_v4())),
                    );
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item);
            }
        }
        _ => {}
    }
}
