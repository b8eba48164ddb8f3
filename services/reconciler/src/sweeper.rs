// Expiry sweep: cancels stale pending records and runs their compensations

use chrono::NaiveDateTime;
use reconciler_core::{is_expired, TransactionRecord};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::integration::{Inventory, Messenger};
use crate::metrics;
use crate::store::RecordStore;

pub struct ExpirySweeper {
    store: Arc<dyn RecordStore>,
    messenger: Arc<dyn Messenger>,
    inventory: Arc<dyn Inventory>,
    expiry_minutes: i64,
}

impl ExpirySweeper {
    pub fn new(
        store: Arc<dyn RecordStore>,
        messenger: Arc<dyn Messenger>,
        inventory: Arc<dyn Inventory>,
        expiry_minutes: i64,
    ) -> Self {
        Self {
            store,
            messenger,
            inventory,
            expiry_minutes,
        }
    }

    /// Cancel every record older than the expiry threshold and run its
    /// compensations. Returns the ids canceled in this sweep so the matcher
    /// can skip them without another store read.
    ///
    /// Compensations run after the state write in fixed order: prompt
    /// deletion, cancellation notice, inventory restock. Each is
    /// independently fallible; expiry is final regardless of delivery.
    pub async fn run(
        &self,
        records: &[TransactionRecord],
        now: NaiveDateTime,
    ) -> Result<Vec<String>> {
        let mut canceled = Vec::new();

        for record in records.iter().filter(|r| r.is_pending()) {
            if !is_expired(record, now, self.expiry_minutes) {
                continue;
            }

            // Atomic conditional write; a record resolved since the pending
            // fetch reports no transition and is left alone.
            if !self.store.mark_canceled(&record.transaction_id).await? {
                info!(
                    "transaction {} already resolved, skipping expiry",
                    record.transaction_id
                );
                continue;
            }

            info!("⏰ transaction {} expired, order canceled", record.transaction_id);
            metrics::RECORDS_EXPIRED.inc();
            canceled.push(record.transaction_id.clone());

            if let Err(e) = self
                .messenger
                .delete_message(record.chat_id, record.message_id)
                .await
            {
                warn!(
                    "failed to delete prompt for expired transaction {}: {}",
                    record.transaction_id, e
                );
            }

            let notice = cancellation_message(record);
            if let Err(e) = self.messenger.send_message(record.chat_id, &notice).await {
                warn!(
                    "failed to send cancellation notice for {}: {}",
                    record.transaction_id, e
                );
            }

            if let Err(e) = self
                .inventory
                .restore_stock(&record.order_data, &record.product_code)
                .await
            {
                error!(
                    "failed to restore stock for canceled transaction {}: {}",
                    record.transaction_id, e
                );
            }
        }

        Ok(canceled)
    }
}

fn cancellation_message(record: &TransactionRecord) -> String {
    format!(
        "*Transaction {} has expired.*\n\n*The order was automatically canceled ❌.*",
        record.transaction_id
    )
}
