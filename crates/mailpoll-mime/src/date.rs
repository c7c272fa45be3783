//! Message date parsing.

use chrono::{DateTime, FixedOffset};

/// Parses a header date the way mail clients meet them in the wild.
///
/// Tries RFC 2822 first, then the same text with a trailing zone comment
/// such as `(PDT)` removed, then a missing-seconds variant, then RFC 3339
/// and the IMAP `INTERNALDATE` form (`17-Jul-1996 02:44:25 -0700`).
/// Returns `None` when nothing matches.
#[must_use]
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt);
    }

    let without_comment = strip_trailing_comment(value);
    if let Ok(dt) = DateTime::parse_from_rfc2822(without_comment) {
        return Some(dt);
    }

    let without_weekday = without_comment
        .split_once(',')
        .map_or(without_comment, |(_, rest)| rest.trim_start());
    if let Ok(dt) = DateTime::parse_from_str(without_weekday, "%d %b %Y %H:%M %z") {
        return Some(dt);
    }

    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%d-%b-%Y %H:%M:%S %z"))
        .ok()
}

/// Removes a trailing `(...)` comment.
fn strip_trailing_comment(value: &str) -> &str {
    if value.ends_with(')')
        && let Some(open) = value.rfind('(')
    {
        return value[..open].trim_end();
    }
    value
}
