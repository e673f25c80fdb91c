//! Utility functions for timestamp normalization and logging.
//!
//! Source pages carry publication timestamps in wildly different shapes:
//! RFC 3339 in `<time datetime>` attributes and meta tags, bare ISO 8601
//! without an offset, RFC 2822 in legacy `pubdate` metas, and free-text forms
//! like `"12:48 AM EDT, Tue April 22, 2025"` on CNN live pages. Everything
//! funnels through [`normalize_timestamp`] so records carry one canonical
//! format or nothing.

use chrono::{DateTime, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical timestamp format stored on article records.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Matches textual timestamps like `"Updated 12:48 AM EDT, Tue April 22, 2025"`.
/// The timezone abbreviation and weekday are matched but discarded; the stamp
/// is kept as written on the page, same as the machine-readable forms.
static TEXTUAL_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:updated\s+)?(\d{1,2}:\d{2}\s*[AP]M)\s+[A-Z]{2,4},\s*(?:[A-Za-z]{3,4}\s+)?([A-Za-z]+ \d{1,2}, \d{4})$",
    )
    .unwrap()
});

/// Normalize a raw timestamp string to `YYYY-MM-DD HH:MM:SS`.
///
/// Tries, in order: RFC 3339 (`2025-04-22T12:48:00Z`, offset forms), bare
/// ISO 8601 without an offset, RFC 2822, and the textual form above. Returns
/// `None` when nothing matches; callers leave the field absent rather than
/// guessing.
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.format(TIMESTAMP_FORMAT).to_string());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.format(TIMESTAMP_FORMAT).to_string());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.format(TIMESTAMP_FORMAT).to_string());
    }

    if let Some(caps) = TEXTUAL_TIMESTAMP.captures(trimmed) {
        let recombined = format!("{} {}", &caps[2], &caps[1]);
        if let Ok(dt) = NaiveDateTime::parse_from_str(&recombined, "%B %d, %Y %I:%M %p") {
            return Some(dt.format(TIMESTAMP_FORMAT).to_string());
        }
    }

    None
}

/// Truncate a string for logging purposes.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let cut = s
            .char_indices()
            .take_while(|(i, _)| *i <= max)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rfc3339_utc() {
        assert_eq!(
            normalize_timestamp("2025-04-22T12:48:00Z"),
            Some("2025-04-22 12:48:00".to_string())
        );
    }

    #[test]
    fn test_normalize_rfc3339_with_offset() {
        // The stamp is kept as written on the page, not converted to UTC.
        assert_eq!(
            normalize_timestamp("2023-10-01T08:30:00-04:00"),
            Some("2023-10-01 08:30:00".to_string())
        );
    }

    #[test]
    fn test_normalize_naive_iso() {
        assert_eq!(
            normalize_timestamp("2023-10-01T08:30:00"),
            Some("2023-10-01 08:30:00".to_string())
        );
        assert_eq!(
            normalize_timestamp("2023-10-01 08:30:00"),
            Some("2023-10-01 08:30:00".to_string())
        );
    }

    #[test]
    fn test_normalize_textual_cnn_form() {
        assert_eq!(
            normalize_timestamp("12:48 AM EDT, Tue April 22, 2025"),
            Some("2025-04-22 00:48:00".to_string())
        );
        assert_eq!(
            normalize_timestamp("Updated 3:05 PM EST, Mon January 6, 2025"),
            Some("2025-01-06 15:05:00".to_string())
        );
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(normalize_timestamp(""), None);
        assert_eq!(normalize_timestamp("yesterday"), None);
        assert_eq!(normalize_timestamp("99:99 XM QQQ, Foo 45, 202"), None);
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("bytes)"));
    }
}
