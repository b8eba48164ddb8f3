// Record store adapter: typed query/update operations over transaction
// records. All state transitions are atomic conditional updates keyed by
// transaction id, applied only while the record is still pending.

use async_trait::async_trait;
use reconciler_core::TransactionRecord;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::error::Result;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records still awaiting resolution, in creation order.
    async fn find_pending(&self) -> Result<Vec<TransactionRecord>>;

    /// Fresh read of a single record.
    async fn find_by_id(&self, transaction_id: &str) -> Result<Option<TransactionRecord>>;

    /// Transition to canceled iff the record is still pending at write time.
    /// Returns whether this call performed the transition.
    async fn mark_canceled(&self, transaction_id: &str) -> Result<bool>;

    /// Transition to success iff the record is still pending at write time.
    /// Returns whether this call performed the transition.
    async fn mark_success(&self, transaction_id: &str) -> Result<bool>;
}

/// SQLite-backed store. The conditional `WHERE ... AND is_success = 0 AND
/// is_canceled = 0` clause makes each transition at-most-once even under
/// concurrent passes; callers branch on the affected-row count instead of
/// re-reading the record first.
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                transaction_id      TEXT PRIMARY KEY,
                chat_id             INTEGER NOT NULL,
                message_id          INTEGER NOT NULL,
                created_at          TEXT NOT NULL,
                total_price         INTEGER NOT NULL,
                product_code        TEXT NOT NULL,
                order_data          TEXT NOT NULL,
                variant_description TEXT NOT NULL DEFAULT '',
                is_success          INTEGER NOT NULL DEFAULT 0,
                is_canceled         INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Used by the ordering flow when a purchase prompt is issued.
    pub async fn insert(&self, record: &TransactionRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                transaction_id, chat_id, message_id, created_at, total_price,
                product_code, order_data, variant_description, is_success, is_canceled
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.transaction_id)
        .bind(record.chat_id)
        .bind(record.message_id)
        .bind(&record.created_at)
        .bind(record.total_price)
        .bind(&record.product_code)
        .bind(&record.order_data)
        .bind(&record.variant_description)
        .bind(record.is_success)
        .bind(record.is_canceled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn record_from_row(row: &SqliteRow) -> std::result::Result<TransactionRecord, sqlx::Error> {
    Ok(TransactionRecord {
        transaction_id: row.try_get("transaction_id")?,
        chat_id: row.try_get("chat_id")?,
        message_id: row.try_get("message_id")?,
        created_at: row.try_get("created_at")?,
        total_price: row.try_get("total_price")?,
        product_code: row.try_get("product_code")?,
        order_data: row.try_get("order_data")?,
        variant_description: row.try_get("variant_description")?,
        is_success: row.try_get("is_success")?,
        is_canceled: row.try_get("is_canceled")?,
    })
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn find_pending(&self) -> Result<Vec<TransactionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM transactions
            WHERE is_success = 0 AND is_canceled = 0
            ORDER BY created_at, transaction_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(record_from_row(row)?);
        }
        Ok(records)
    }

    async fn find_by_id(&self, transaction_id: &str) -> Result<Option<TransactionRecord>> {
        let row = sqlx::query("SELECT * FROM transactions WHERE transaction_id = ?")
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(record_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn mark_canceled(&self, transaction_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transactions SET is_canceled = 1
            WHERE transaction_id = ? AND is_success = 0 AND is_canceled = 0
            "#,
        )
        .bind(transaction_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_success(&self, transaction_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transactions SET is_success = 1
            WHERE transaction_id = ? AND is_success = 0 AND is_canceled = 0
            "#,
        )
        .bind(transaction_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteRecordStore {
        // A single connection keeps every query on the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteRecordStore::from_pool(pool).await.unwrap()
    }

    fn record(id: &str) -> TransactionRecord {
        TransactionRecord {
            transaction_id: id.to_string(),
            chat_id: 7,
            message_id: 70,
            created_at: "2025-08-25 10:00:00".to_string(),
            total_price: 15_000,
            product_code: "dns".to_string(),
            order_data: "host-1".to_string(),
            variant_description: "premium".to_string(),
            is_success: false,
            is_canceled: false,
        }
    }

    #[tokio::test]
    async fn test_find_pending_excludes_resolved() {
        let store = memory_store().await;
        store.insert(&record("A")).await.unwrap();
        store.insert(&record("B")).await.unwrap();
        store.insert(&record("C")).await.unwrap();

        assert!(store.mark_success("A").await.unwrap());
        assert!(store.mark_canceled("B").await.unwrap());

        let pending = store.find_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].transaction_id, "C");
    }

    #[tokio::test]
    async fn test_mark_success_is_at_most_once() {
        let store = memory_store().await;
        store.insert(&record("A")).await.unwrap();

        assert!(store.mark_success("A").await.unwrap());
        // second attempt finds the record no longer pending
        assert!(!store.mark_success("A").await.unwrap());

        let fresh = store.find_by_id("A").await.unwrap().unwrap();
        assert!(fresh.is_success);
        assert!(!fresh.is_canceled);
    }

    #[tokio::test]
    async fn test_canceled_record_cannot_become_success() {
        let store = memory_store().await;
        store.insert(&record("A")).await.unwrap();

        assert!(store.mark_canceled("A").await.unwrap());
        assert!(!store.mark_success("A").await.unwrap());

        let fresh = store.find_by_id("A").await.unwrap().unwrap();
        assert!(fresh.is_canceled);
        assert!(!fresh.is_success);
    }

    #[tokio::test]
    async fn test_transitions_on_unknown_id_do_nothing() {
        let store = memory_store().await;
        assert!(!store.mark_canceled("missing").await.unwrap());
        assert!(!store.mark_success("missing").await.unwrap());
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }
}
