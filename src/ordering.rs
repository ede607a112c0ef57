//! Total-order sort keys for display ordering.
//!
//! Records are laid out by (day precedence, time of day, program code).
//! Compound weekday ranges come first, then single weekdays, Saturday,
//! Sunday, and finally the two unknown buckets: unmapped specs, then the
//! missing-value sentinel strictly last.

use chrono::{NaiveTime, Timelike};

use crate::model::{CanonicalDay, DayGroup, RateRecord};
use crate::schedule::{day_tokens, normalize_day};

/// Minutes added to post-midnight slots: a 01:00 programme belongs to the
/// previous broadcast day and must sort after 23:30.
const BROADCAST_DAY_SHIFT: u32 = 24 * 60;

/// Hours below this threshold are treated as the previous broadcast day.
const BROADCAST_DAY_ROLLOVER_HOUR: u32 = 4;

/// Fixed precedence table over canonical day specs.
pub fn day_order(day: &CanonicalDay) -> u8 {
    match day {
        CanonicalDay::MonSat => 0,
        CanonicalDay::MonFri => 1,
        CanonicalDay::MonSun => 2,
        CanonicalDay::Mon => 10,
        CanonicalDay::Tue => 20,
        CanonicalDay::TueThu => 21,
        CanonicalDay::Wed => 30,
        CanonicalDay::Thu => 40,
        CanonicalDay::Fri => 50,
        CanonicalDay::Sat => 60,
        CanonicalDay::Sun => 70,
        CanonicalDay::Unknown(_) => 98,
        CanonicalDay::Missing => 99,
    }
}

/// Comparable ordinal for an `HH:MM` time. Hours 0–3 shift one day forward,
/// and anything unparseable sorts after every valid slot.
pub fn time_ordinal(time: Option<&str>) -> u32 {
    match time.and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok()) {
        Some(time) => {
            let minutes = time.hour() * 60 + time.minute();
            if time.hour() < BROADCAST_DAY_ROLLOVER_HOUR {
                minutes + BROADCAST_DAY_SHIFT
            } else {
                minutes
            }
        }
        None => u32::MAX,
    }
}

/// Selects the template block a raw day spec belongs to: exactly Saturday,
/// exactly Sunday, everything else is the weekday block.
pub fn day_group(raw_day: &str) -> DayGroup {
    match day_tokens(raw_day).as_slice() {
        [single] if single == "SAT" => DayGroup::Saturday,
        [single] if single == "SUN" => DayGroup::Sunday,
        _ => DayGroup::Weekday,
    }
}

/// Sorts records ascending by (day order, time ordinal, program code).
/// The code tie-break guarantees a strict total order, so output is
/// deterministic for identical inputs.
pub fn sort_records(records: &mut [RateRecord]) {
    records.sort_by_cached_key(|record| {
        (
            day_order(&normalize_day(&record.day_spec)),
            time_ordinal(record.time.as_deref()),
            record.program_code.clone(),
        )
    });
}
