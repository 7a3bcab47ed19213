//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Registration with validated price and stock
//! - Lookup and listing
//! - Hard delete
//!
//! Stock is never written here after registration; only the inventory
//! ledger (`crate::inventory`) moves it, inside a sale's unit of work.
//!
//! ## Hard Delete
//! ```text
//! DELETE products row ──► sale_lines keep product_id + price snapshot
//!                         sale detail shows `product: null`
//!                         cancelling that sale skips the restoration
//! ```

use std::sync::Arc;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;
use ventas_core::validation::validate_new_product;
use ventas_core::{Clock, CoreError, NewProduct, Product};

use crate::error::{DbError, DbResult, ServiceResult};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let product = db.products().create(&new_product).await?;
/// let same = db.products().get_by_id(&product.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        ProductRepository { pool, clock }
    }

    /// Registers a product.
    ///
    /// ## Errors
    /// - `ValidationError` for a blank name, a negative price or negative stock
    pub async fn create(&self, input: &NewProduct) -> ServiceResult<Product> {
        validate_new_product(input)?;

        let now = self.clock.now();
        let product = Product {
            id: generate_product_id(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            price_cents: input.price_cents,
            stock: input.stock,
            image_url: input.image_url.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        insert(&mut conn, &product).await?;

        Ok(product)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Gets a product by ID, failing with `ProductNotFound`.
    pub async fn get(&self, id: &str) -> ServiceResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    /// Lists all products by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, stock, image_url, created_at, updated_at
            FROM products
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Deletes a product row.
    ///
    /// ## Errors
    /// - `ProductNotFound` if no such product exists
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        Ok(())
    }

    /// Counts products (for diagnostics and the seed utility).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, description, price_cents, stock, image_url, created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(product)
}

async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, description, price_cents, stock, image_url, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(product.stock)
    .bind(&product.image_url)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
