// Data models for the reconciliation core

use serde::{Deserialize, Serialize};

/// Resolution state of a transaction record. Monotonic: once `Success` or
/// `Canceled`, a record never reverts or re-transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Success,
    Canceled,
}

/// A purchase awaiting payment confirmation, created by the ordering flow
/// and resolved exactly once by the reconciler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub chat_id: i64,
    /// Reference to the previously sent payment prompt, for deletion.
    pub message_id: i64,
    /// `"YYYY-MM-DD HH:mm:ss"`, source of the expiry clock.
    pub created_at: String,
    /// Integer currency unit (IDR).
    pub total_price: i64,
    pub product_code: String,
    /// Opaque payload delivered to the buyer on success, one unit per line.
    pub order_data: String,
    pub variant_description: String,
    pub is_success: bool,
    pub is_canceled: bool,
}

impl TransactionRecord {
    pub fn status(&self) -> TransactionStatus {
        if self.is_success {
            TransactionStatus::Success
        } else if self.is_canceled {
            TransactionStatus::Canceled
        } else {
            TransactionStatus::Pending
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.is_success && !self.is_canceled
    }
}

/// One externally reported payment event. Ephemeral: the gateway assigns no
/// identity stable across polls, so entries may reappear and must be safe to
/// re-evaluate without side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEntry {
    /// Integer currency unit, same unit as `TransactionRecord::total_price`.
    pub amount: i64,
    /// `"YYYY-MM-DD HH:mm:ss"`, same clock domain as record creation time.
    pub date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TransactionRecord {
        TransactionRecord {
            transaction_id: "TRX-1".to_string(),
            chat_id: 1,
            message_id: 10,
            created_at: "2025-08-25 10:00:00".to_string(),
            total_price: 50_000,
            product_code: "vcc".to_string(),
            order_data: "user1|pass1".to_string(),
            variant_description: "1 month".to_string(),
            is_success: false,
            is_canceled: false,
        }
    }

    #[test]
    fn test_status_pending_by_default() {
        let r = record();
        assert!(r.is_pending());
        assert_eq!(r.status(), TransactionStatus::Pending);
    }

    #[test]
    fn test_status_terminal_states() {
        let mut r = record();
        r.is_success = true;
        assert_eq!(r.status(), TransactionStatus::Success);
        assert!(!r.is_pending());

        let mut r = record();
        r.is_canceled = true;
        assert_eq!(r.status(), TransactionStatus::Canceled);
        assert!(!r.is_pending());
    }
}
