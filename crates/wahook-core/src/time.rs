// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp helpers.
//!
//! All persisted timestamps are RFC 3339 UTC text with millisecond
//! precision, matching the storage layer's lexicographic-ordering
//! assumption.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};

/// Current time as canonical RFC 3339 UTC text.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert a provider epoch timestamp to RFC 3339, validating plausibility.
///
/// Provider payloads carry `messageTimestamp` in seconds and
/// `senderTimestampMs` in milliseconds, sometimes garbage. Values outside
/// [2000-01-01, now + 1 year] fall back to receipt time rather than
/// poisoning ordering with a bogus epoch.
pub fn epoch_to_rfc3339(value: i64, millis: bool) -> String {
    let candidate: Option<DateTime<Utc>> = if millis {
        Utc.timestamp_millis_opt(value).single()
    } else {
        Utc.timestamp_opt(value, 0).single()
    };

    match candidate {
        Some(ts) if is_plausible(&ts) => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
        _ => now_rfc3339(),
    }
}

fn is_plausible(ts: &DateTime<Utc>) -> bool {
    let floor = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).single();
    let ceiling = Utc::now() + Duration::days(365);
    match floor {
        Some(floor) => *ts >= floor && *ts <= ceiling,
        None => false,
    }
}
