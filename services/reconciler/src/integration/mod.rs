// External collaborator seams: the payment-gateway mutation feed, the
// messaging channel and inventory restocking. Production clients live in
// the sibling modules; mock implementations in `mock` back the test suite.

pub mod mock;
pub mod qris;
pub mod telegram;

use async_trait::async_trait;
use reconciler_core::MutationEntry;
use std::path::Path;

use crate::error::Result;

#[async_trait]
pub trait MutationFeed: Send + Sync {
    /// Fetch recent payment mutations. A malformed gateway payload maps to
    /// an empty list; an `Err` means the feed was unreachable. Either way
    /// the cycle treats it as "no data this pass" rather than a failure.
    async fn fetch_mutations(&self) -> Result<Vec<MutationEntry>>;
}

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Remove a previously sent payment prompt. May fail if the message is
    /// already gone; such failures never revert a committed transition.
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()>;

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Deliver a file to the recipient. The caller owns the file's
    /// lifecycle; it may be deleted as soon as this returns.
    async fn send_document(&self, chat_id: i64, file_path: &Path) -> Result<()>;
}

#[async_trait]
pub trait Inventory: Send + Sync {
    /// Return reserved units to stock after a cancellation.
    async fn restore_stock(&self, order_data: &str, product_code: &str) -> Result<()>;
}
