//! # Report Repository
//!
//! The read aggregation layer. Every operation here is a pure read: no
//! statement in this module writes to the store.
//!
//! ## Reports
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────────────┐
//! │ sales_summary                │ counts, revenue, avg ticket, per status  │
//! │ sales_by_date_range          │ paged listing, inclusive calendar dates  │
//! │ top_products                 │ completed sales, revenue desc            │
//! │ revenue_by_period            │ day / ISO week / month buckets           │
//! │ search_sales                 │ client name / email / sale id, paged     │
//! │ inventory_status             │ low stock + out of stock                 │
//! │ product_turnover             │ sold / stock, desc                       │
//! │ products_by_price_range      │ price bands                              │
//! │ clients_summary              │ totals, new in 30 days, buyers           │
//! │ top_clients                  │ completed spend desc                     │
//! │ clients_by_purchase_frequency│ purchase-count groups                    │
//! │ execute_custom_query         │ gate, then run verbatim, read-only       │
//! └──────────────────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! Time-window filters compare RFC 3339 UTC text, which orders lexically.

use std::sync::Arc;

use chrono::{DateTime, Days, Utc};
use serde_json::{Map, Number, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Connection, Row, SqliteConnection, SqlitePool, TypeInfo, ValueRef};
use tracing::{debug, warn};
use ventas_core::query_gate;
use ventas_core::report::{
    bucket_revenue, rank_turnover, validate_non_negative, validate_top_limit, ClientsSummary,
    DateRange, FrequencyGroup, InventoryStatus, Pagination, Period, PriceRangeBucket,
    RevenueReport, SaleListing, SalesPage, SalesSummary, SearchResults, TopClient, TopProduct,
    TopProductsQuery, TurnoverEntry, NEW_CLIENT_WINDOW_DAYS,
};
use ventas_core::validation::validate_search_term;
use ventas_core::{Clock, CoreError, Product, ValidationError};

use crate::error::{DbError, DbResult, ServiceResult};

/// A row of a custom query, keyed by column name.
pub type JsonRow = Map<String, Value>;

/// Read-only analytics over the store.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        ReportRepository { pool, clock }
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Store-wide sales figures over every status.
    pub async fn sales_summary(&self) -> DbResult<SalesSummary> {
        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT
                COUNT(*) AS total_sales,
                COUNT(DISTINCT client_id) AS unique_clients,
                COALESCE(SUM(total_cents), 0) AS total_revenue_cents,
                CAST(ROUND(AVG(total_cents)) AS INTEGER) AS avg_ticket_cents,
                MIN(sold_at) AS first_sale,
                MAX(sold_at) AS last_sale,
                COUNT(CASE WHEN status = 'completed' THEN 1 END) AS completed_sales,
                COUNT(CASE WHEN status = 'pending' THEN 1 END) AS pending_sales,
                COUNT(CASE WHEN status = 'cancelled' THEN 1 END) AS cancelled_sales
            FROM sales
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Sales between two calendar dates (both inclusive), newest first.
    pub async fn sales_by_date_range(
        &self,
        range: DateRange,
        pagination: Pagination,
    ) -> DbResult<SalesPage> {
        let (lower, upper) = range.bounds();
        debug!(?lower, ?upper, page = pagination.page(), "Listing sales by date range");

        let sales = sqlx::query_as::<_, SaleListing>(
            r#"
            SELECT s.id, s.total_cents, s.status, s.sold_at,
                   c.name AS client_name, c.email AS client_email
            FROM sales s
            JOIN clients c ON c.id = s.client_id
            WHERE (?1 IS NULL OR s.sold_at >= ?1)
              AND (?2 IS NULL OR s.sold_at < ?2)
            ORDER BY s.sold_at DESC, s.id
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(lower)
        .bind(upper)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM sales s
            WHERE (?1 IS NULL OR s.sold_at >= ?1)
              AND (?2 IS NULL OR s.sold_at < ?2)
            "#,
        )
        .bind(lower)
        .bind(upper)
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesPage {
            sales,
            pagination: pagination.page_info(total),
            filters: range,
        })
    }

    /// Best-selling products by revenue over completed sales.
    pub async fn top_products(&self, query: TopProductsQuery) -> DbResult<Vec<TopProduct>> {
        let products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                p.id AS product_id,
                p.name AS product_name,
                p.price_cents,
                SUM(l.quantity) AS units_sold,
                SUM(l.subtotal_cents) AS revenue_cents,
                COUNT(DISTINCT l.sale_id) AS times_sold
            FROM products p
            JOIN sale_lines l ON l.product_id = p.id
            JOIN sales s ON s.id = l.sale_id
            WHERE s.status = 'completed'
            GROUP BY p.id, p.name, p.price_cents
            HAVING SUM(l.quantity) >= ?1
            ORDER BY revenue_cents DESC, p.id
            LIMIT ?2
            "#,
        )
        .bind(query.min_sales)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Completed-sale revenue grouped by period, ascending.
    pub async fn revenue_by_period(&self, period: Period, range: DateRange) -> DbResult<RevenueReport> {
        let (lower, upper) = range.bounds();

        let sales: Vec<(DateTime<Utc>, i64)> = sqlx::query_as(
            r#"
            SELECT sold_at, total_cents
            FROM sales
            WHERE status = 'completed'
              AND (?1 IS NULL OR sold_at >= ?1)
              AND (?2 IS NULL OR sold_at < ?2)
            "#,
        )
        .bind(lower)
        .bind(upper)
        .fetch_all(&self.pool)
        .await?;

        Ok(RevenueReport {
            period,
            data: bucket_revenue(period, sales),
            filters: range,
        })
    }

    /// Sales whose client name or email contains `term` (any case), or whose
    /// id contains it.
    ///
    /// ## Errors
    /// - `ValidationError` for an empty or overlong term
    pub async fn search_sales(
        &self,
        term: &str,
        pagination: Pagination,
    ) -> ServiceResult<SearchResults> {
        let term = validate_search_term(term)?;
        // Client keys are stored lowercased with Unicode rules, so fold the
        // term the same way instead of relying on SQLite's ASCII-only LOWER().
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));

        let sales = sqlx::query_as::<_, SaleListing>(
            r#"
            SELECT s.id, s.total_cents, s.status, s.sold_at,
                   c.name AS client_name, c.email AS client_email
            FROM sales s
            JOIN clients c ON c.id = s.client_id
            WHERE c.name_key LIKE ?1 ESCAPE '\'
               OR c.email_key LIKE ?1 ESCAPE '\'
               OR s.id LIKE ?1 ESCAPE '\'
            ORDER BY s.sold_at DESC, s.id
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM sales s
            JOIN clients c ON c.id = s.client_id
            WHERE c.name_key LIKE ?1 ESCAPE '\'
               OR c.email_key LIKE ?1 ESCAPE '\'
               OR s.id LIKE ?1 ESCAPE '\'
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok(SearchResults {
            search_term: term,
            sales,
            pagination: pagination.page_info(total),
        })
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Stock levels with low-stock (`stock <= threshold`) and out-of-stock
    /// partitions, ascending by stock.
    pub async fn inventory_status(&self, low_stock_threshold: i64) -> ServiceResult<InventoryStatus> {
        let threshold = validate_non_negative("low_stock_threshold", low_stock_threshold)?;

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, stock, image_url, created_at, updated_at
            FROM products
            ORDER BY stock ASC, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(InventoryStatus::from_products(products, threshold))
    }

    /// Units sold in completed sales per unit of current stock, descending.
    pub async fn product_turnover(&self, limit: i64) -> ServiceResult<Vec<TurnoverEntry>> {
        let limit = validate_top_limit(limit)?;

        let rows: Vec<(String, String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                p.id,
                p.name,
                p.stock,
                COALESCE(SUM(CASE WHEN s.status = 'completed' THEN l.quantity END), 0) AS total_sold
            FROM products p
            LEFT JOIN sale_lines l ON l.product_id = p.id
            LEFT JOIN sales s ON s.id = l.sale_id
            GROUP BY p.id, p.name, p.stock
            ORDER BY p.name, p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let entries = rows
            .into_iter()
            .map(|(id, name, stock, sold)| TurnoverEntry::new(id, name, stock, sold))
            .collect();

        Ok(rank_turnover(entries, limit))
    }

    /// Products grouped into price bands, cheapest band first.
    pub async fn products_by_price_range(&self) -> DbResult<Vec<PriceRangeBucket>> {
        let buckets = sqlx::query_as::<_, PriceRangeBucket>(
            r#"
            SELECT
                CASE
                    WHEN price_cents < 10000 THEN '0-99'
                    WHEN price_cents < 50000 THEN '100-499'
                    WHEN price_cents < 200000 THEN '500-1999'
                    WHEN price_cents < 1000000 THEN '2000-9999'
                    ELSE '10000+'
                END AS price_range,
                COUNT(*) AS product_count,
                CAST(ROUND(AVG(price_cents)) AS INTEGER) AS avg_price_cents,
                COALESCE(SUM(stock), 0) AS total_stock
            FROM products
            GROUP BY price_range
            ORDER BY MIN(price_cents)
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(buckets)
    }

    // =========================================================================
    // Clients
    // =========================================================================

    /// Client totals; "new" is relative to the injected clock.
    pub async fn clients_summary(&self) -> DbResult<ClientsSummary> {
        let now = self.clock.now();
        let since = now
            .checked_sub_days(Days::new(NEW_CLIENT_WINDOW_DAYS))
            .unwrap_or(now);

        let summary = sqlx::query_as::<_, ClientsSummary>(
            r#"
            SELECT
                COUNT(*) AS total_clients,
                COUNT(CASE WHEN c.created_at >= ?1 THEN 1 END) AS new_last_30_days,
                COUNT(CASE WHEN EXISTS (SELECT 1 FROM sales s WHERE s.client_id = c.id)
                           THEN 1 END) AS clients_with_purchases,
                COUNT(CASE WHEN NOT EXISTS (SELECT 1 FROM sales s WHERE s.client_id = c.id)
                           THEN 1 END) AS clients_without_purchases
            FROM clients c
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Clients ranked by completed spend.
    pub async fn top_clients(&self, limit: i64) -> ServiceResult<Vec<TopClient>> {
        let limit = validate_top_limit(limit)?;

        let clients = sqlx::query_as::<_, TopClient>(
            r#"
            SELECT
                c.id AS client_id,
                c.name AS client_name,
                c.email AS client_email,
                COUNT(s.id) AS total_purchases,
                SUM(s.total_cents) AS total_spent_cents,
                CAST(ROUND(AVG(s.total_cents)) AS INTEGER) AS avg_purchase_cents,
                MAX(s.sold_at) AS last_purchase
            FROM clients c
            JOIN sales s ON s.client_id = c.id
            WHERE s.status = 'completed'
            GROUP BY c.id, c.name, c.email
            ORDER BY total_spent_cents DESC, c.id
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    /// Clients grouped by number of completed purchases.
    pub async fn clients_by_purchase_frequency(&self) -> DbResult<Vec<FrequencyGroup>> {
        let groups = sqlx::query_as::<_, FrequencyGroup>(
            r#"
            SELECT
                CASE
                    WHEN purchase_count = 0 THEN '0'
                    WHEN purchase_count = 1 THEN '1'
                    WHEN purchase_count BETWEEN 2 AND 5 THEN '2-5'
                    WHEN purchase_count BETWEEN 6 AND 20 THEN '6-20'
                    ELSE '21+'
                END AS frequency_group,
                COUNT(*) AS client_count,
                CAST(ROUND(AVG(total_spent)) AS INTEGER) AS avg_total_spent_cents
            FROM (
                SELECT
                    c.id,
                    COUNT(s.id) AS purchase_count,
                    COALESCE(SUM(s.total_cents), 0) AS total_spent
                FROM clients c
                LEFT JOIN sales s ON s.client_id = c.id AND s.status = 'completed'
                GROUP BY c.id
            ) AS client_stats
            GROUP BY frequency_group
            ORDER BY MIN(purchase_count)
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    // =========================================================================
    // Custom query
    // =========================================================================

    /// Runs a caller-written query after it passes the gate.
    ///
    /// The gate is a denylist, so the text still runs on a connection with
    /// `query_only` set, inside a transaction that is always rolled back.
    /// A write hidden in accepted text fails as a `Store` error and changes
    /// nothing.
    ///
    /// ## Errors
    /// - `ValidationError` for empty text
    /// - `RejectedQuery` when the gate refuses it
    /// - `Store` when SQLite refuses it
    pub async fn execute_custom_query(&self, text: &str) -> ServiceResult<Vec<JsonRow>> {
        if text.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "query".to_string(),
            }
            .into());
        }

        query_gate::validate(text).map_err(CoreError::from)?;

        debug!(length = text.len(), "Running custom query");

        let mut conn = self.pool.acquire().await?;
        sqlx::query("PRAGMA query_only = ON").execute(&mut *conn).await?;

        let (outcome, mut reusable) = run_read_only(&mut conn, text).await;

        // The text may have flipped the pragma itself, so always reset it.
        if reusable {
            if let Err(e) = sqlx::query("PRAGMA query_only = OFF").execute(&mut *conn).await {
                warn!(error = %e, "Could not reset query_only after a custom query");
                reusable = false;
            }
        }
        if !reusable {
            warn!("Closing connection left in an unknown state by a custom query");
            drop(conn.detach());
        }

        let rows = outcome?;
        let json = rows.iter().map(row_to_json).collect::<DbResult<Vec<_>>>()?;

        Ok(json)
    }
}

/// Runs `text` in a transaction that is rolled back whatever happens.
///
/// The flag is false when the rollback failed, which means the text ended
/// the transaction on its own and the connection must not be pooled again.
async fn run_read_only(
    conn: &mut SqliteConnection,
    text: &str,
) -> (DbResult<Vec<SqliteRow>>, bool) {
    let mut tx = match conn.begin().await {
        Ok(tx) => tx,
        Err(e) => return (Err(e.into()), true),
    };

    let rows = sqlx::query(text).fetch_all(&mut *tx).await;
    let clean = match tx.rollback().await {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Custom query ended its own transaction");
            false
        }
    };

    (rows.map_err(DbError::from), clean)
}

/// Escapes `\`, `%` and `_` for a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Converts a row of unknown shape to a JSON object using each value's
/// storage class.
fn row_to_json(row: &SqliteRow) -> DbResult<JsonRow> {
    let mut map = Map::new();

    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx).map_err(DbError::from)?;

        let value = if raw.is_null() {
            Value::Null
        } else {
            let class = raw.type_info().name().to_string();
            match class.as_str() {
                "INTEGER" | "BOOLEAN" => Value::from(row.try_get_unchecked::<i64, _>(idx)?),
                "REAL" | "NUMERIC" => Number::from_f64(row.try_get_unchecked::<f64, _>(idx)?)
                    .map_or(Value::Null, Value::Number),
                "BLOB" => Value::from(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
                _ => Value::String(row.try_get_unchecked::<String, _>(idx)?),
            }
        };

        map.insert(column.name().to_string(), value);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("ana"), "ana");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
