//! # Sale Repository
//!
//! Storage of sales and their lines, and the assembled read models.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (SaleWorkflow::create, one unit of work)                    │
//! │     └── insert_sale()  → Sale { status: Completed }                    │
//! │     └── insert_line()  → SaleLine (position 0)                         │
//! │     └── insert_line()  → SaleLine (position 1) ...                     │
//! │                                                                         │
//! │  2. READ                                                               │
//! │     └── fetch_detail() → SaleDetail { sale, client, lines }            │
//! │                                                                         │
//! │  3. CANCEL (SaleWorkflow::cancel, one unit of work)                    │
//! │     └── mark_cancelled() → Sale { status: Cancelled }                  │
//! │                                                                         │
//! │  Lines are never updated or deleted by the application.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;
use ventas_core::{ClientSummary, ProductSummary, Sale, SaleDetail, SaleLine, SaleLineDetail};

use crate::error::DbResult;

/// Read side of sales, on a pooled connection.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its client and lines.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleDetail>> {
        let mut conn = self.pool.acquire().await?;
        fetch_detail(&mut conn, id).await
    }

    /// All sales with their clients and lines, most recent first.
    pub async fn list_all(&self) -> DbResult<Vec<SaleDetail>> {
        let mut conn = self.pool.acquire().await?;
        list_details(&mut conn).await
    }

    /// Counts sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Row shapes
// =============================================================================

#[derive(Debug, FromRow)]
struct SaleWithClient {
    #[sqlx(flatten)]
    sale: Sale,
    client_name: String,
    client_email: String,
}

#[derive(Debug, FromRow)]
struct LineWithProduct {
    #[sqlx(flatten)]
    line: SaleLine,
    product_name: Option<String>,
}

impl LineWithProduct {
    fn into_detail(self) -> SaleLineDetail {
        let product = self.product_name.map(|name| ProductSummary {
            id: self.line.product_id.clone(),
            name,
        });
        SaleLineDetail {
            line: self.line,
            product,
        }
    }
}

fn assemble(header: SaleWithClient, lines: Vec<SaleLineDetail>) -> SaleDetail {
    SaleDetail {
        client: ClientSummary {
            id: header.sale.client_id.clone(),
            name: header.client_name,
            email: header.client_email,
        },
        sale: header.sale,
        lines,
    }
}

// =============================================================================
// Statements
// =============================================================================

/// Loads a sale header.
pub(crate) async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(
        r#"
        SELECT id, client_id, total_cents, status, sold_at, created_at, updated_at
        FROM sales
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(sale)
}

/// Loads the lines of a sale in request order.
pub(crate) async fn fetch_lines(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleLine>> {
    let lines = sqlx::query_as::<_, SaleLine>(
        r#"
        SELECT id, sale_id, product_id, position, quantity, unit_price_cents, subtotal_cents
        FROM sale_lines
        WHERE sale_id = ?1
        ORDER BY position
        "#,
    )
    .bind(sale_id)
    .fetch_all(conn)
    .await?;

    Ok(lines)
}

/// Loads a sale with its client and lines.
pub(crate) async fn fetch_detail(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<SaleDetail>> {
    let header = sqlx::query_as::<_, SaleWithClient>(
        r#"
        SELECT s.id, s.client_id, s.total_cents, s.status, s.sold_at, s.created_at, s.updated_at,
               c.name AS client_name, c.email AS client_email
        FROM sales s
        JOIN clients c ON c.id = s.client_id
        WHERE s.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(header) = header else {
        return Ok(None);
    };

    let lines = sqlx::query_as::<_, LineWithProduct>(
        r#"
        SELECT l.id, l.sale_id, l.product_id, l.position, l.quantity,
               l.unit_price_cents, l.subtotal_cents,
               p.name AS product_name
        FROM sale_lines l
        LEFT JOIN products p ON p.id = l.product_id
        WHERE l.sale_id = ?1
        ORDER BY l.position
        "#,
    )
    .bind(id)
    .fetch_all(conn)
    .await?
    .into_iter()
    .map(LineWithProduct::into_detail)
    .collect();

    Ok(Some(assemble(header, lines)))
}

/// Loads every sale with its client and lines, most recent first.
///
/// Two queries regardless of the number of sales; lines are grouped in memory.
pub(crate) async fn list_details(conn: &mut SqliteConnection) -> DbResult<Vec<SaleDetail>> {
    let headers = sqlx::query_as::<_, SaleWithClient>(
        r#"
        SELECT s.id, s.client_id, s.total_cents, s.status, s.sold_at, s.created_at, s.updated_at,
               c.name AS client_name, c.email AS client_email
        FROM sales s
        JOIN clients c ON c.id = s.client_id
        ORDER BY s.sold_at DESC, s.created_at DESC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let rows = sqlx::query_as::<_, LineWithProduct>(
        r#"
        SELECT l.id, l.sale_id, l.product_id, l.position, l.quantity,
               l.unit_price_cents, l.subtotal_cents,
               p.name AS product_name
        FROM sale_lines l
        LEFT JOIN products p ON p.id = l.product_id
        ORDER BY l.sale_id, l.position
        "#,
    )
    .fetch_all(conn)
    .await?;

    let mut lines_by_sale: HashMap<String, Vec<SaleLineDetail>> = HashMap::new();
    for row in rows {
        lines_by_sale
            .entry(row.line.sale_id.clone())
            .or_default()
            .push(row.into_detail());
    }

    Ok(headers
        .into_iter()
        .map(|header| {
            let lines = lines_by_sale.remove(&header.sale.id).unwrap_or_default();
            assemble(header, lines)
        })
        .collect())
}

/// Inserts a sale header.
pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, client_id = %sale.client_id, total_cents = sale.total_cents, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (id, client_id, total_cents, status, sold_at, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.client_id)
    .bind(sale.total_cents)
    .bind(sale.status)
    .bind(sale.sold_at)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Inserts one sale line.
pub(crate) async fn insert_line(conn: &mut SqliteConnection, line: &SaleLine) -> DbResult<()> {
    debug!(sale_id = %line.sale_id, product_id = %line.product_id, quantity = line.quantity, "Inserting sale line");

    sqlx::query(
        r#"
        INSERT INTO sale_lines (
            id, sale_id, product_id, position, quantity, unit_price_cents, subtotal_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&line.id)
    .bind(&line.sale_id)
    .bind(&line.product_id)
    .bind(line.position)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line.subtotal_cents)
    .execute(conn)
    .await?;

    Ok(())
}

/// Flips a sale to cancelled unless it already is.
///
/// Returns `false` when the sale was already cancelled (or is gone): the
/// status guard makes a second, concurrent cancel a no-op here.
pub(crate) async fn mark_cancelled(
    conn: &mut SqliteConnection,
    id: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(id = %id, "Cancelling sale");

    let result = sqlx::query(
        r#"
        UPDATE sales
        SET status = 'cancelled', updated_at = ?2
        WHERE id = ?1 AND status != 'cancelled'
        "#,
    )
    .bind(id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
