// Mock collaborators for tests: deterministic, call-recording versions of
// the record store, mutation feed, messenger and inventory.

use async_trait::async_trait;
use reconciler_core::{MutationEntry, TransactionRecord};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{Inventory, Messenger, MutationFeed};
use crate::error::{ReconcileError, Result};
use crate::store::RecordStore;

/// Ordered in-memory record store. Keeps insertion order so tests can rely
/// on the same iteration order the SQLite store produces.
#[derive(Default, Clone)]
pub struct MemoryRecordStore {
    records: Arc<RwLock<Vec<TransactionRecord>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: TransactionRecord) {
        self.records.write().await.push(record);
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_pending(&self) -> Result<Vec<TransactionRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| r.is_pending()).cloned().collect())
    }

    async fn find_by_id(&self, transaction_id: &str) -> Result<Option<TransactionRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| r.transaction_id == transaction_id)
            .cloned())
    }

    async fn mark_canceled(&self, transaction_id: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        match records
            .iter_mut()
            .find(|r| r.transaction_id == transaction_id)
        {
            Some(record) if record.is_pending() => {
                record.is_canceled = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_success(&self, transaction_id: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        match records
            .iter_mut()
            .find(|r| r.transaction_id == transaction_id)
        {
            Some(record) if record.is_pending() => {
                record.is_success = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Scripted mutation feed with optional latency and simulated outages.
#[derive(Default, Clone)]
pub struct MockFeed {
    entries: Arc<RwLock<Vec<MutationEntry>>>,
    failing: Arc<RwLock<bool>>,
    latency_ms: u64,
}

impl MockFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency_ms: u64) -> Self {
        Self {
            latency_ms,
            ..Self::default()
        }
    }

    pub async fn set_entries(&self, entries: Vec<MutationEntry>) {
        *self.entries.write().await = entries;
    }

    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }
}

#[async_trait]
impl MutationFeed for MockFeed {
    async fn fetch_mutations(&self) -> Result<Vec<MutationEntry>> {
        if self.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;
        }
        if *self.failing.read().await {
            return Err(ReconcileError::Feed("simulated gateway outage".to_string()));
        }
        Ok(self.entries.read().await.clone())
    }
}

/// Call-recording messenger.
#[derive(Default, Clone)]
pub struct MockMessenger {
    deleted: Arc<RwLock<Vec<(i64, i64)>>>,
    messages: Arc<RwLock<Vec<(i64, String)>>>,
    documents: Arc<RwLock<Vec<(i64, String, String)>>>,
    fail_deletes: Arc<RwLock<bool>>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delete_message fail, as when the prompt is already gone.
    pub async fn set_fail_deletes(&self, fail: bool) {
        *self.fail_deletes.write().await = fail;
    }

    pub async fn deleted_messages(&self) -> Vec<(i64, i64)> {
        self.deleted.read().await.clone()
    }

    pub async fn sent_messages(&self) -> Vec<(i64, String)> {
        self.messages.read().await.clone()
    }

    /// (chat_id, file name, file contents) per delivered document.
    pub async fn sent_documents(&self) -> Vec<(i64, String, String)> {
        self.documents.read().await.clone()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        if *self.fail_deletes.read().await {
            return Err(ReconcileError::Messaging(
                "message to delete not found".to_string(),
            ));
        }
        self.deleted.write().await.push((chat_id, message_id));
        Ok(())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.messages.write().await.push((chat_id, text.to_string()));
        Ok(())
    }

    async fn send_document(&self, chat_id: i64, file_path: &Path) -> Result<()> {
        let contents = tokio::fs::read_to_string(file_path).await?;
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.documents
            .write()
            .await
            .push((chat_id, file_name, contents));
        Ok(())
    }
}

/// Call-recording inventory.
#[derive(Default, Clone)]
pub struct MockInventory {
    restocks: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// (order_data, product_code) per restock call.
    pub async fn restocks(&self) -> Vec<(String, String)> {
        self.restocks.read().await.clone()
    }
}

#[async_trait]
impl Inventory for MockInventory {
    async fn restore_stock(&self, order_data: &str, product_code: &str) -> Result<()> {
        self.restocks
            .write()
            .await
            .push((order_data.to_string(), product_code.to_string()));
        Ok(())
    }
}
