//! # Inventory Ledger (store side)
//!
//! Stock mutations, always inside a caller's unit of work.
//!
//! ```text
//! take_stock(P, 3)     UPDATE products SET stock = stock - 3
//!                      WHERE id = P AND stock >= 3          → 0 rows = lost race
//!
//! restore_stock(P, 3)  UPDATE products SET stock = stock + 3
//!                      WHERE id = P                         → 0 rows = product gone
//! ```
//!
//! The guard in `take_stock` is what keeps stock at or above zero when two
//! sales compete for the same units; the sufficiency check done before it
//! (`ventas_core::inventory::ensure_available`) only produces the nicer error.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

/// Decrements stock by `quantity` if at least that much is on hand.
///
/// Returns `false` when the guard failed (or the product is gone), in which
/// case nothing was changed.
pub async fn take_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(product_id = %product_id, quantity, "Taking stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Gives `quantity` units back to a product.
///
/// Returns `false` when the product no longer exists; that is not an error.
pub async fn restore_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock + ?2, updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    let restored = result.rows_affected() == 1;
    if restored {
        debug!(product_id = %product_id, quantity, "Stock restored");
    } else {
        debug!(product_id = %product_id, quantity, "Product gone, restoration skipped");
    }
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use ventas_core::NewProduct;

    #[tokio::test]
    async fn test_take_stock_never_goes_negative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .create(&NewProduct {
                name: "Cable".into(),
                description: None,
                price_cents: 500,
                stock: 5,
                image_url: None,
            })
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let now = Utc::now();
        assert!(take_stock(&mut conn, &product.id, 3, now).await.unwrap());
        assert!(!take_stock(&mut conn, &product.id, 3, now).await.unwrap());
        assert!(take_stock(&mut conn, &product.id, 2, now).await.unwrap());
        assert!(!take_stock(&mut conn, &product.id, 1, now).await.unwrap());
        drop(conn);

        let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 0);
    }

    #[tokio::test]
    async fn test_restore_missing_product_is_noop() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        assert!(!restore_stock(&mut conn, "missing", 4, Utc::now()).await.unwrap());
    }
}
