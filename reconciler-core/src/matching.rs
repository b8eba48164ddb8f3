// Expiry predicate and the pure match algorithm between pending records
// and mutation entries. Free of I/O so it can be tested against fixtures.

use chrono::NaiveDateTime;
use tracing::warn;

use crate::models::{MutationEntry, TransactionRecord};
use crate::time::{parse_timestamp, whole_minutes_between};

/// A pending record paired with the mutation entry that satisfies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPair {
    pub transaction_id: String,
    pub entry_index: usize,
}

/// Whether a record's age, in whole elapsed minutes from `created_at` to
/// `now`, has reached the expiry threshold. A record with an unreadable
/// creation timestamp never expires here; it is logged and left alone.
pub fn is_expired(record: &TransactionRecord, now: NaiveDateTime, expiry_minutes: i64) -> bool {
    match parse_timestamp(&record.created_at) {
        Some(created) => whole_minutes_between(created, now) >= expiry_minutes,
        None => {
            warn!(
                "transaction {} has unreadable created_at {:?}, skipping expiry check",
                record.transaction_id, record.created_at
            );
            false
        }
    }
}

/// The match predicate: exact integer amount equality, and the entry's
/// whole-minute age is strictly below the match window. Entries with
/// unreadable timestamps never match.
pub fn entry_satisfies(
    record: &TransactionRecord,
    entry: &MutationEntry,
    now: NaiveDateTime,
    window_minutes: i64,
) -> bool {
    if entry.amount != record.total_price {
        return false;
    }
    match parse_timestamp(&entry.date) {
        Some(paid_at) => whole_minutes_between(paid_at, now) < window_minutes,
        None => {
            warn!("mutation entry has unreadable date {:?}, ignoring", entry.date);
            false
        }
    }
}

/// Pair each pending record with at most one satisfying mutation entry.
///
/// Records are visited in the given order, entries in feed order; the first
/// satisfying entry wins and is claimed, so a later record with the same
/// price cannot consume it again in this pass and stays pending for a
/// future cycle. Non-pending records are skipped entirely.
pub fn match_pending(
    records: &[TransactionRecord],
    entries: &[MutationEntry],
    now: NaiveDateTime,
    window_minutes: i64,
) -> Vec<MatchPair> {
    let mut claimed = vec![false; entries.len()];
    let mut pairs = Vec::new();

    for record in records.iter().filter(|r| r.is_pending()) {
        for (entry_index, entry) in entries.iter().enumerate() {
            if claimed[entry_index] {
                continue;
            }
            if entry_satisfies(record, entry, now, window_minutes) {
                claimed[entry_index] = true;
                pairs.push(MatchPair {
                    transaction_id: record.transaction_id.clone(),
                    entry_index,
                });
                break;
            }
        }
    }

    pairs
}
