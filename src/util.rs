use std::env;

use chrono::{TimeZone, Utc};

/// Timestamps below this are interpreted as epoch seconds and scaled to
/// milliseconds. Anything at or above it is already a millisecond epoch.
const MS_EPOCH_THRESHOLD: i64 = 1_000_000_000_000;

pub(crate) fn env_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Normalize an event timestamp to a millisecond epoch. Bridge payloads carry
/// either seconds or milliseconds depending on the event source.
pub(crate) fn normalize_timestamp_ms(ts: i64) -> i64 {
    if ts > 0 && ts < MS_EPOCH_THRESHOLD {
        ts * 1000
    } else {
        ts
    }
}

pub(crate) fn format_timestamp(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        _ => ms.to_string(),
    }
}

pub(crate) fn digits_of(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Phone-number shape: optional leading `+`, then digits, spaces and dashes,
/// with at least 7 digits total.
pub(crate) fn looks_like_phone(s: &str) -> bool {
    let s = s.trim();
    let body = s.strip_prefix('+').unwrap_or(s);
    if body.is_empty() {
        return false;
    }
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
    {
        return false;
    }
    body.chars().filter(|c| c.is_ascii_digit()).count() >= 7
}

/// Truncate to at most `max` characters on a char boundary, appending an
/// ellipsis when anything was cut.
pub(crate) fn truncate_preview(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_seconds_to_millis() {
        assert_eq!(normalize_timestamp_ms(1_700_000_000), 1_700_000_000_000);
    }

    #[test]
    fn normalize_keeps_millis() {
        assert_eq!(normalize_timestamp_ms(1_700_000_000_123), 1_700_000_000_123);
    }

    #[test]
    fn normalize_keeps_zero() {
        assert_eq!(normalize_timestamp_ms(0), 0);
    }

    #[test]
    fn phone_shapes() {
        assert!(looks_like_phone("+91 99190 03141"));
        assert!(looks_like_phone("555-123-4567"));
        assert!(looks_like_phone("15551234567"));
        assert!(!looks_like_phone("12345"));
        assert!(!looks_like_phone("call me maybe"));
        assert!(!looks_like_phone("+"));
        assert!(!looks_like_phone(""));
    }

    #[test]
    fn digits_extraction() {
        assert_eq!(digits_of("+91 99190 03141"), "919919003141");
        assert_eq!(digits_of("abc"), "");
    }

    #[test]
    fn preview_truncation() {
        assert_eq!(truncate_preview("short", 10), "short");
        assert_eq!(truncate_preview("abcdefghij", 5), "abcde…");
    }
}
