// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `{{variable}}` substitution over the trigger context.
//!
//! Applied to every string field of an action's parameters before
//! dispatch. Unknown variables render as empty text rather than leaking
//! the literal placeholder into a task title or outbound message.

use serde_json::Value;

use wahook_core::types::Trigger;

/// Substitute `{{name}}` placeholders with context values.
pub fn render(template: &str, trigger: &Trigger) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                if let Some(value) = trigger.field(name) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                // Unterminated placeholder, keep the literal text.
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Render every string leaf of an action's parameters.
pub fn render_params(params: &Value, trigger: &Trigger) -> Value {
    match params {
        Value::String(s) => Value::String(render(s, trigger)),
        Value::Array(items) => Value::Array(items.iter().map(|v| render_params(v, trigger)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_params(v, trigger)))
                .collect(),
        ),
        other => other.clone(),
    }
}
