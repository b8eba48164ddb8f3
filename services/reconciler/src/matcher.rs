// Payment matcher: pairs pending records with mutation entries and runs
// the success transition with its delivery side effects.

use chrono::NaiveDateTime;
use reconciler_core::{match_pending, MutationEntry, TransactionRecord};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::integration::Messenger;
use crate::metrics;
use crate::store::RecordStore;

pub struct PaymentMatcher {
    store: Arc<dyn RecordStore>,
    messenger: Arc<dyn Messenger>,
    window_minutes: i64,
    data_dir: PathBuf,
}

impl PaymentMatcher {
    pub fn new(
        store: Arc<dyn RecordStore>,
        messenger: Arc<dyn Messenger>,
        window_minutes: i64,
        data_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            messenger,
            window_minutes,
            data_dir,
        }
    }

    /// Settle every record with a satisfying mutation entry. Returns how
    /// many records this pass transitioned to success.
    pub async fn run(
        &self,
        records: &[TransactionRecord],
        entries: &[MutationEntry],
        now: NaiveDateTime,
    ) -> Result<usize> {
        let pairs = match_pending(records, entries, now, self.window_minutes);
        let mut settled = 0;

        for pair in &pairs {
            let Some(record) = records
                .iter()
                .find(|r| r.transaction_id == pair.transaction_id)
            else {
                continue;
            };

            // Atomic conditional write: if the sweeper or an earlier pass
            // resolved this record in the meantime, no transition happens
            // and no side effect fires.
            if !self.store.mark_success(&record.transaction_id).await? {
                info!(
                    "transaction {} already resolved, skipping match",
                    record.transaction_id
                );
                continue;
            }

            settled += 1;
            metrics::RECORDS_MATCHED.inc();
            info!(
                "💰 payment found for transaction {} (Rp {})",
                record.transaction_id, record.total_price
            );

            // The transition above is committed; delivery failures from
            // here on are logged and the success stands.
            if let Err(e) = self
                .messenger
                .delete_message(record.chat_id, record.message_id)
                .await
            {
                warn!(
                    "failed to delete prompt for settled transaction {}: {}",
                    record.transaction_id, e
                );
            }

            let text = success_message(record);
            if let Err(e) = self.messenger.send_message(record.chat_id, &text).await {
                warn!(
                    "failed to send success notice for {}: {}",
                    record.transaction_id, e
                );
            }

            if let Err(e) = self.deliver_order_file(record).await {
                warn!(
                    "failed to deliver order payload for {}: {}",
                    record.transaction_id, e
                );
            }
        }

        Ok(settled)
    }

    /// One-shot delivery of the order payload: written to a temp file named
    /// after the transaction, sent, then removed on both outcome paths.
    async fn deliver_order_file(&self, record: &TransactionRecord) -> Result<()> {
        let path = self
            .data_dir
            .join(format!("{}.txt", record.transaction_id));

        tokio::fs::write(&path, record.order_data.as_bytes()).await?;
        let send_result = self.messenger.send_document(record.chat_id, &path).await;
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("failed to remove temp artifact {}: {}", path.display(), e);
        }

        send_result
    }
}

fn success_message(record: &TransactionRecord) -> String {
    format!(
        "─-─-─-⟨ *TRANSACTION SUCCESSFUL 🎉* ⟩-─-─-\n\
         │ • *Transaction ID :* `{}`\n\
         │ • *Product Code :* {}\n\
         │ • *Total Paid :* Rp {}\n\
         ─-─-─-─-─-─-─-─\n\
         │ 📜 {}\n\
         ─-─-─-─-─-─-─-─\n\
         ╰─➤ *Your order details are in the .txt file below 👇*",
        record.transaction_id,
        record.product_code.to_uppercase(),
        format_idr(record.total_price),
        record.variant_description
    )
}

/// Indonesian grouping: thousands separated by dots (50000 -> "50.000").
fn format_idr(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
