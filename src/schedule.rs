//! Canonicalization of raw day-of-week and time strings.
//!
//! Source spreadsheets are inconsistent about separators, token order,
//! diacritics and casing ("SEG/TER/QUA/QUI/SEX", "seg, ter, qua, qui, sex"
//! and "SEX SEG TER QUA QUI" all describe the same weekday schedule). The
//! normalizer reduces every spec to a token set before matching, so the
//! canonical label is independent of how the source happened to write it.

use chrono::{NaiveDateTime, NaiveTime};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::model::CanonicalDay;

/// Upper-cases, trims, and strips diacritics via NFD decomposition.
pub fn normalize_text(raw: &str) -> String {
    raw.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .trim()
        .to_uppercase()
}

/// Splits a normalized spec on whitespace, slash, comma and semicolon,
/// collapsing duplicates while keeping first-seen order.
fn split_tokens(normalized: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for part in normalized.split(|c: char| c.is_whitespace() || matches!(c, '/' | ',' | ';')) {
        if !part.is_empty() && !tokens.contains(&part) {
            tokens.push(part);
        }
    }
    tokens
}

/// Maps a day token to its canonical atom. Source data uses Portuguese
/// abbreviations; already-canonical atoms pass through.
fn canonical_atom(token: &str) -> Option<&'static str> {
    match token {
        "SEG" | "MON" => Some("MON"),
        "TER" | "TUE" => Some("TUE"),
        "QUA" | "WED" => Some("WED"),
        "QUI" | "THU" => Some("THU"),
        "SEX" | "FRI" => Some("FRI"),
        "SAB" | "SAT" => Some("SAT"),
        "DOM" | "SUN" => Some("SUN"),
        _ => None,
    }
}

/// Canonical atoms of a raw spec, in first-seen order. Tokens that are not
/// day atoms are kept verbatim so arbitrary compound specs survive.
pub(crate) fn day_tokens(raw: &str) -> Vec<String> {
    let normalized = normalize_text(raw);
    split_tokens(&normalized)
        .into_iter()
        .map(|token| canonical_atom(token).unwrap_or(token).to_string())
        .collect()
}

const WEEKDAYS: [&str; 5] = ["MON", "TUE", "WED", "THU", "FRI"];

fn is_set(tokens: &[String], reference: &[&str]) -> bool {
    tokens.len() == reference.len() && reference.iter().all(|day| tokens.iter().any(|t| t == day))
}

/// Canonicalizes a raw day-of-week spec. Matching is order-independent;
/// anything outside the fixed vocabulary comes back as
/// [`CanonicalDay::Unknown`] carrying the normalized tokens.
pub fn normalize_day(raw: &str) -> CanonicalDay {
    let normalized = normalize_text(raw);
    if normalized.is_empty() || normalized == "-" {
        return CanonicalDay::Missing;
    }

    // Dash ranges appear both in source data and as our own canonical
    // labels; recognizing them keeps canonicalization idempotent.
    match normalized.as_str() {
        "SEG-SEX" | "MON-FRI" => return CanonicalDay::MonFri,
        "SEG-SAB" | "MON-SAT" => return CanonicalDay::MonSat,
        "SEG-DOM" | "MON-SUN" => return CanonicalDay::MonSun,
        "TER-QUI" | "TUE-THU" => return CanonicalDay::TueThu,
        _ => {}
    }

    let tokens = day_tokens(raw);
    if is_set(&tokens, &WEEKDAYS) {
        return CanonicalDay::MonFri;
    }
    if is_set(&tokens, &["MON", "TUE", "WED", "THU", "FRI", "SAT"]) {
        return CanonicalDay::MonSat;
    }
    if is_set(&tokens, &["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"]) {
        return CanonicalDay::MonSun;
    }
    if is_set(&tokens, &["TUE", "THU"]) {
        return CanonicalDay::TueThu;
    }
    if let [single] = tokens.as_slice() {
        match single.as_str() {
            "MON" => return CanonicalDay::Mon,
            "TUE" => return CanonicalDay::Tue,
            "WED" => return CanonicalDay::Wed,
            "THU" => return CanonicalDay::Thu,
            "FRI" => return CanonicalDay::Fri,
            "SAT" => return CanonicalDay::Sat,
            "SUN" => return CanonicalDay::Sun,
            _ => {}
        }
    }
    CanonicalDay::Unknown(tokens.join("/"))
}

/// Normalizes a raw time into `HH:MM`. Accepts pre-formatted times, full
/// datetimes, and free strings with an `HH:MM` prefix; any parse failure
/// yields `None` (rendered as the `-` sentinel) rather than an error.
pub fn normalize_time(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || value == "-" {
        return None;
    }

    if let Ok(stamp) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(stamp.format("%H:%M").to_string());
    }
    for format in ["%H:%M:%S", "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(value, format) {
            return Some(time.format("%H:%M").to_string());
        }
    }

    let prefix: String = value.chars().take(5).collect();
    NaiveTime::parse_from_str(prefix.trim(), "%H:%M")
        .ok()
        .map(|time| time.format("%H:%M").to_string())
}
