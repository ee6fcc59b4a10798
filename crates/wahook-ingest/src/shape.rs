// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural shape detection for raw webhook payloads.
//!
//! The provider delivers the same logical event in several nesting shapes:
//! a named array directly on the payload, a `data` array, a `data` object,
//! or the bare payload itself. Detection tries those in a fixed order and
//! picks the first shape whose records carry the event's identity field,
//! so downstream mappers only ever see individual record objects.

use serde_json::Value;

/// Resolve a dotted path like `key.id` inside a JSON object.
pub fn pluck<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}

/// Resolve the first present path out of several alternatives, as a str.
pub fn pluck_str<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a str> {
    paths.iter().find_map(|p| pluck(value, p)?.as_str())
}

fn has_identity(record: &Value, identity_paths: &[&str]) -> bool {
    record.is_object()
        && identity_paths
            .iter()
            .any(|p| pluck(record, p).is_some_and(|v| !v.is_null()))
}

fn valid_records(candidate: Vec<&Value>, identity_paths: &[&str]) -> Option<Vec<Value>> {
    let valid: Vec<Value> = candidate
        .into_iter()
        .filter(|r| has_identity(r, identity_paths))
        .cloned()
        .collect();
    if valid.is_empty() { None } else { Some(valid) }
}

/// Extract the record objects out of a raw payload.
///
/// `array_field` is the event's named collection (`messages` for message
/// events, `None` for events whose records sit directly in the payload).
/// `identity_paths` name the field(s) a structurally valid record must
/// carry; a shape producing zero valid records is skipped, and the next
/// shape is tried. Returns an empty vec when no shape yields a valid
/// record.
pub fn detect_records(
    payload: &Value,
    array_field: Option<&str>,
    identity_paths: &[&str],
) -> Vec<Value> {
    // 1. Named array directly on the payload.
    if let Some(items) = array_field.and_then(|f| payload.get(f)).and_then(Value::as_array) {
        if let Some(records) = valid_records(items.iter().collect(), identity_paths) {
            return records;
        }
    }

    // 2. `data` as an array.
    if let Some(items) = payload.get("data").and_then(Value::as_array) {
        if let Some(records) = valid_records(items.iter().collect(), identity_paths) {
            return records;
        }
    }

    // 3. `data` as an object, possibly wrapping the named array.
    if let Some(data) = payload.get("data").filter(|d| d.is_object()) {
        if let Some(items) = array_field.and_then(|f| data.get(f)).and_then(Value::as_array) {
            if let Some(records) = valid_records(items.iter().collect(), identity_paths) {
                return records;
            }
        }
        if let Some(records) = valid_records(vec![data], identity_paths) {
            return records;
        }
    }

    // 4. Bare payload, array or single object.
    if let Some(items) = payload.as_array() {
        if let Some(records) = valid_records(items.iter().collect(), identity_paths) {
            return records;
        }
    } else if let Some(records) = valid_records(vec![payload], identity_paths) {
        return records;
    }

    Vec::new()
}
