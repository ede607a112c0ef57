//! Record deduplication.
//!
//! Overlapping import batches repeat rows; the documented policy is to
//! collapse them silently, keeping the first occurrence of each identity
//! key. Region is not part of the key: two records identical in program,
//! day and time but covering different regions are distinct entries and
//! both survive, because dedup only runs over a single region's record set.

use std::collections::HashSet;

use crate::model::RateRecord;

/// Keeps exactly one record per identity key, first-seen wins. Pure and
/// idempotent: consolidating an already-consolidated sequence returns it
/// unchanged.
pub fn consolidate(records: Vec<RateRecord>) -> Vec<RateRecord> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.identity_key()) {
            kept.push(record);
        }
    }
    kept
}
