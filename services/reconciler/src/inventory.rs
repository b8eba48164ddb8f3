// Inventory restocking: returns a canceled order's reserved units to the
// stock table, one line of order_data per unit.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::Result;
use crate::integration::Inventory;

pub struct SqliteInventory {
    pool: SqlitePool,
}

impl SqliteInventory {
    pub async fn prepare(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS product_stock (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                product_code TEXT NOT NULL,
                item         TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Inventory for SqliteInventory {
    async fn restore_stock(&self, order_data: &str, product_code: &str) -> Result<()> {
        let mut restored = 0u64;
        for item in order_data.lines().filter(|line| !line.trim().is_empty()) {
            sqlx::query("INSERT INTO product_stock (product_code, item) VALUES (?, ?)")
                .bind(product_code)
                .bind(item)
                .execute(&self.pool)
                .await?;
            restored += 1;
        }

        info!("restored {} unit(s) of {} to stock", restored, product_code);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::Row;

    async fn memory_inventory() -> SqliteInventory {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteInventory::prepare(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_restore_stock_one_row_per_unit() {
        let inventory = memory_inventory().await;
        inventory
            .restore_stock("acc-1|pw\nacc-2|pw\n\n", "npx")
            .await
            .unwrap();

        let rows =
            sqlx::query("SELECT product_code, item FROM product_stock ORDER BY id")
                .fetch_all(&inventory.pool)
                .await
                .unwrap();
        assert_eq!(rows.len(), 2);
        let code: String = rows[0].try_get("product_code").unwrap();
        let item: String = rows[1].try_get("item").unwrap();
        assert_eq!(code, "npx");
        assert_eq!(item, "acc-2|pw");
    }

    #[tokio::test]
    async fn test_restore_stock_empty_order_is_a_no_op() {
        let inventory = memory_inventory().await;
        inventory.restore_stock("", "npx").await.unwrap();

        let rows = sqlx::query("SELECT * FROM product_stock")
            .fetch_all(&inventory.pool)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
