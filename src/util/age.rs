//! Age formatting in the style of `kubectl get`.

use chrono::{DateTime, Utc};

/// Parses an RFC 3339 timestamp such as `2026-02-07T17:00:00Z`.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Age of an object created at `created`, relative to `now`.
pub fn format_age(created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match created {
        Some(ts) => human_duration((now - ts).num_seconds()),
        None => "<unknown>".to_string(),
    }
}

/// Formats a duration in seconds with the precision kubectl uses: more
/// detail for young objects, coarser units as they age.
pub fn human_duration(secs: i64) -> String {
    if secs < -1 {
        return "<invalid>".to_string();
    }
    if secs < 0 {
        return "0s".to_string();
    }
    if secs < 60 * 2 {
        return format!("{}s", secs);
    }
    let minutes = secs / 60;
    if minutes < 10 {
        let s = secs % 60;
        return if s == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m{}s", minutes, s)
        };
    }
    if minutes < 60 * 3 {
        return format!("{}m", minutes);
    }
    let hours = minutes / 60;
    if hours < 8 {
        let m = minutes % 60;
        return if m == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h{}m", hours, m)
        };
    }
    if hours < 48 {
        return format!("{}h", hours);
    }
    let days = hours / 24;
    if hours < 24 * 8 {
        let h = hours % 24;
        return if h == 0 {
            format!("{}d", days)
        } else {
            format!("{}d{}h", days, h)
        };
    }
    if hours < 24 * 365 * 2 {
        return format!("{}d", days);
    }
    let years = days / 365;
    if hours < 24 * 365 * 8 {
        let d = days % 365;
        return if d == 0 {
            format!("{}y", years)
        } else {
            format!("{}y{}d", years, d)
        };
    }
    format!("{}y", years)
}
