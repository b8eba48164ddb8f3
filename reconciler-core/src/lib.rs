// Pure reconciliation domain: records, mutation entries, the expiry
// predicate and the match algorithm. No I/O lives in this crate.

pub mod matching;
pub mod models;
pub mod time;

pub use matching::{entry_satisfies, is_expired, match_pending, MatchPair};
pub use models::{MutationEntry, TransactionRecord, TransactionStatus};
