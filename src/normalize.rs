//! Cleanup of raw feed fields into [`Article`](crate::models::Article) form.
//!
//! Feed dates arrive as RFC 2822 strings and descriptions as HTML fragments.
//! Both are converted here: dates to UTC, descriptions to short plain text.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Convert an RFC 2822 date (as found in RSS `pubDate`) to UTC.
///
/// Returns `None` when the string cannot be parsed; the caller drops the item.
pub fn normalize_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render a timestamp in the store's canonical form, e.g.
/// `2025-05-06T14:30:00+00:00`.
pub fn canonical_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 with any offset, and naive ISO date-times which are read
/// as UTC.
pub fn parse_canonical_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Strip markup from a feed description and cut it to `max_chars` characters.
///
/// Entities are decoded and runs of whitespace (including non-breaking
/// spaces) collapse to a single space.
pub fn clean_description(raw: &str, max_chars: usize) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(raw);
    let text = fragment.root_element().text().collect::<String>();
    let collapsed = WHITESPACE.replace_all(&text, " ");
    truncate_chars(collapsed.trim(), max_chars)
}

/// Keep at most `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Serde adapter for [`Article::published`](crate::models::Article).
pub mod timestamp {
    use super::{canonical_timestamp, parse_canonical_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&canonical_timestamp(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_canonical_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp {raw:?}")))
    }
}
