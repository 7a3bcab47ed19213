//! # Report Parameters and Shapes
//!
//! Everything the read aggregation layer needs that does not touch the store:
//! parameter validation, pagination math, date bounds, period bucketing and
//! the row types returned by each report.
//!
//! ## Parameter Defaults
//! ```text
//! ┌──────────────────────┬─────────┬──────────────┐
//! │ parameter            │ default │ accepted     │
//! ├──────────────────────┼─────────┼──────────────┤
//! │ page                 │ 1       │ >= 1         │
//! │ limit (paged)        │ 50      │ 1..=100      │
//! │ limit (rankings)     │ 10      │ 1..=20       │
//! │ min_sales            │ 1       │ >= 0         │
//! │ low_stock_threshold  │ 10      │ >= 0         │
//! │ period               │ day     │ day|week|month│
//! └──────────────────────┴─────────┴──────────────┘
//! ```
//!
//! Money columns are cents; averages are rounded half away from zero.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Product, ProductSummary, SaleStatus};
use crate::validation::{parse_date, validate_range, ValidationResult};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const DEFAULT_TOP_LIMIT: i64 = 10;
pub const MAX_TOP_LIMIT: i64 = 20;
pub const DEFAULT_MIN_SALES: i64 = 1;
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Window for "new clients" in the clients summary.
pub const NEW_CLIENT_WINDOW_DAYS: u64 = 30;

/// Ratio reported for a product that sold units but has no stock left.
pub const TURNOVER_SENTINEL: f64 = 999.99;

// =============================================================================
// Parameters
// =============================================================================

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    page: i64,
    limit: i64,
}

impl Pagination {
    /// ## Errors
    /// `OutOfRange` when `page < 1` or `limit` is outside `1..=100`.
    pub fn new(page: i64, limit: i64) -> ValidationResult<Self> {
        validate_range("page", page, 1, i64::MAX)?;
        validate_range("limit", limit, 1, MAX_PAGE_LIMIT)?;
        Ok(Pagination { page, limit })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Rows to skip. Saturates instead of overflowing on absurd pages.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Page metadata for a result set of `total` rows.
    pub fn page_info(&self, total: i64) -> PageInfo {
        PageInfo {
            page: self.page,
            limit: self.limit,
            total,
            pages: (total + self.limit - 1) / self.limit,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Pagination block echoed with paged results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    /// `ceil(total / limit)`
    pub pages: i64,
}

/// Optional calendar-date bounds, both inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(rename = "start_date")]
    pub start: Option<NaiveDate>,
    #[serde(rename = "end_date")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Parses `YYYY-MM-DD` strings; `None` leaves that side open.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> ValidationResult<Self> {
        Ok(DateRange {
            start: start.map(|s| parse_date("start_date", s)).transpose()?,
            end: end.map(|s| parse_date("end_date", s)).transpose()?,
        })
    }

    /// Instant bounds as `[lower, upper)`.
    ///
    /// The end date covers its whole day, so the upper bound is midnight of
    /// the following day.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use ventas_core::report::DateRange;
    ///
    /// let range = DateRange {
    ///     start: None,
    ///     end: NaiveDate::from_ymd_opt(2024, 3, 31),
    /// };
    /// let (_, upper) = range.bounds();
    /// assert_eq!(upper.unwrap().to_rfc3339(), "2024-04-01T00:00:00+00:00");
    /// ```
    pub fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let lower = self.start.map(start_of_day);
        let upper = self
            .end
            .map(|d| d.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX))
            .map(start_of_day);
        (lower, upper)
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Bucket size for revenue reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Day,
    /// ISO week, labelled by its Monday.
    Week,
    Month,
}

impl Period {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }

    /// Label of the bucket containing `at`.
    ///
    /// ```text
    /// day   → 2024-03-14
    /// week  → 2024-03-11   (Monday of that ISO week)
    /// month → 2024-03
    /// ```
    pub fn bucket_label(&self, at: DateTime<Utc>) -> String {
        let date = at.date_naive();
        match self {
            Period::Day => date.format("%Y-%m-%d").to_string(),
            Period::Week => {
                let back = u64::from(date.weekday().num_days_from_monday());
                let monday = date.checked_sub_days(Days::new(back)).unwrap_or(date);
                monday.format("%Y-%m-%d").to_string()
            }
            Period::Month => date.format("%Y-%m").to_string(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            _ => Err(ValidationError::NotAllowed {
                field: "period".to_string(),
                allowed: vec!["day".into(), "week".into(), "month".into()],
            }),
        }
    }
}

/// Validated parameters of the top-products ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopProductsQuery {
    pub limit: i64,
    pub min_sales: i64,
}

impl TopProductsQuery {
    pub fn new(limit: i64, min_sales: i64) -> ValidationResult<Self> {
        Ok(TopProductsQuery {
            limit: validate_top_limit(limit)?,
            min_sales: validate_non_negative("min_sales", min_sales)?,
        })
    }
}

impl Default for TopProductsQuery {
    fn default() -> Self {
        TopProductsQuery {
            limit: DEFAULT_TOP_LIMIT,
            min_sales: DEFAULT_MIN_SALES,
        }
    }
}

/// Accepts a ranking limit in `1..=20`.
pub fn validate_top_limit(limit: i64) -> ValidationResult<i64> {
    validate_range("limit", limit, 1, MAX_TOP_LIMIT)?;
    Ok(limit)
}

/// Accepts any value `>= 0`.
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<i64> {
    validate_range(field, value, 0, i64::MAX)?;
    Ok(value)
}

// =============================================================================
// Sales Reports
// =============================================================================

/// Store-wide sales figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesSummary {
    pub total_sales: i64,
    pub unique_clients: i64,
    pub total_revenue_cents: i64,
    /// `None` when there are no sales.
    pub avg_ticket_cents: Option<i64>,
    pub first_sale: Option<DateTime<Utc>>,
    pub last_sale: Option<DateTime<Utc>>,
    pub completed_sales: i64,
    pub pending_sales: i64,
    pub cancelled_sales: i64,
}

/// One sale row in a paged listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleListing {
    pub id: String,
    pub total_cents: i64,
    pub status: SaleStatus,
    pub sold_at: DateTime<Utc>,
    pub client_name: String,
    pub client_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPage {
    pub sales: Vec<SaleListing>,
    pub pagination: PageInfo,
    pub filters: DateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub search_term: String,
    pub sales: Vec<SaleListing>,
    pub pagination: PageInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    pub price_cents: i64,
    pub units_sold: i64,
    pub revenue_cents: i64,
    /// Number of distinct sales the product appeared in.
    pub times_sold: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueBucket {
    pub period: String,
    pub sales_count: i64,
    pub total_revenue_cents: i64,
    pub avg_ticket_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueReport {
    pub period: Period,
    pub data: Vec<RevenueBucket>,
    pub filters: DateRange,
}

/// Groups `(sold_at, total_cents)` pairs into ascending period buckets.
pub fn bucket_revenue<I>(period: Period, sales: I) -> Vec<RevenueBucket>
where
    I: IntoIterator<Item = (DateTime<Utc>, i64)>,
{
    let mut buckets: BTreeMap<String, (i64, Money)> = BTreeMap::new();
    for (sold_at, total_cents) in sales {
        let entry = buckets
            .entry(period.bucket_label(sold_at))
            .or_insert((0, Money::zero()));
        entry.0 += 1;
        entry.1 += Money::from_cents(total_cents);
    }

    buckets
        .into_iter()
        .map(|(label, (count, revenue))| RevenueBucket {
            period: label,
            sales_count: count,
            total_revenue_cents: revenue.cents(),
            avg_ticket_cents: Money::average(revenue, count).map_or(0, |m| m.cents()),
        })
        .collect()
}

// =============================================================================
// Product Reports
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub id: String,
    pub name: String,
    pub stock: i64,
    pub price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub threshold: i64,
    pub count: usize,
    pub products: Vec<StockEntry>,
}

/// Stock levels with low-stock and out-of-stock partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStatus {
    pub total_products: usize,
    pub low_stock_alert: LowStockAlert,
    pub out_of_stock: Vec<ProductSummary>,
}

impl InventoryStatus {
    /// Partitions `products`. Low stock is `stock <= threshold`, out of
    /// stock is `stock == 0`; both keep ascending stock order.
    pub fn from_products(mut products: Vec<Product>, threshold: i64) -> Self {
        products.sort_by_key(|p| p.stock);

        let low: Vec<StockEntry> = products
            .iter()
            .filter(|p| p.stock <= threshold)
            .map(|p| StockEntry {
                id: p.id.clone(),
                name: p.name.clone(),
                stock: p.stock,
                price_cents: p.price_cents,
            })
            .collect();

        let out_of_stock = products
            .iter()
            .filter(|p| p.stock == 0)
            .map(Product::summary)
            .collect();

        InventoryStatus {
            total_products: products.len(),
            low_stock_alert: LowStockAlert {
                threshold,
                count: low.len(),
                products: low,
            },
            out_of_stock,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnoverEntry {
    pub product_id: String,
    pub product_name: String,
    pub stock: i64,
    pub total_sold: i64,
    pub turnover_ratio: f64,
}

impl TurnoverEntry {
    pub fn new(product_id: String, product_name: String, stock: i64, total_sold: i64) -> Self {
        TurnoverEntry {
            turnover_ratio: turnover_ratio(total_sold, stock),
            product_id,
            product_name,
            stock,
            total_sold,
        }
    }
}

/// `sold / stock` rounded to 2 decimals, or [`TURNOVER_SENTINEL`] when
/// nothing is left in stock.
pub fn turnover_ratio(sold: i64, stock: i64) -> f64 {
    if stock <= 0 {
        return TURNOVER_SENTINEL;
    }
    (sold as f64 / stock as f64 * 100.0).round() / 100.0
}

/// Drops products that sold nothing, sorts by ratio descending and keeps
/// the first `limit`.
pub fn rank_turnover(entries: Vec<TurnoverEntry>, limit: i64) -> Vec<TurnoverEntry> {
    let mut ranked: Vec<TurnoverEntry> = entries.into_iter().filter(|e| e.total_sold > 0).collect();
    ranked.sort_by(|a, b| b.turnover_ratio.total_cmp(&a.turnover_ratio));
    ranked.truncate(usize::try_from(limit).unwrap_or(0));
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PriceRangeBucket {
    /// Whole currency units: `0-99`, `100-499`, `500-1999`, `2000-9999`, `10000+`.
    pub price_range: String,
    pub product_count: i64,
    pub avg_price_cents: i64,
    pub total_stock: i64,
}

// =============================================================================
// Client Reports
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ClientsSummary {
    pub total_clients: i64,
    pub new_last_30_days: i64,
    pub clients_with_purchases: i64,
    pub clients_without_purchases: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TopClient {
    pub client_id: String,
    pub client_name: String,
    pub client_email: String,
    pub total_purchases: i64,
    pub total_spent_cents: i64,
    pub avg_purchase_cents: i64,
    pub last_purchase: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FrequencyGroup {
    /// `0`, `1`, `2-5`, `6-20` or `21+` completed purchases.
    pub frequency_group: String,
    pub client_count: i64,
    pub avg_total_spent_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn product(id: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.into(),
            name: id.to_uppercase(),
            description: None,
            price_cents: 1000,
            stock,
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_pagination_bounds() {
        assert!(Pagination::new(1, 1).is_ok());
        assert!(Pagination::new(1, 100).is_ok());
        assert!(Pagination::new(0, 10).is_err());
        assert!(Pagination::new(1, 0).is_err());
        assert!(Pagination::new(1, 101).is_err());
        assert_eq!(Pagination::default().limit(), 50);
    }

    #[test]
    fn test_third_page_of_120_rows() {
        let pagination = Pagination::new(3, 50).unwrap();
        assert_eq!(pagination.offset(), 100);
        assert_eq!(
            pagination.page_info(120),
            PageInfo {
                page: 3,
                limit: 50,
                total: 120,
                pages: 3
            }
        );
        assert_eq!(pagination.page_info(0).pages, 0);
    }

    #[test]
    fn test_date_range_end_covers_whole_day() {
        let range = DateRange::parse(Some("2024-01-01"), Some("2024-01-31")).unwrap();
        let (lower, upper) = range.bounds();
        assert_eq!(lower, Some(at(2024, 1, 1, 0)));
        assert_eq!(upper, Some(at(2024, 2, 1, 0)));

        assert!(DateRange::parse(Some("01/01/2024"), None).is_err());
        assert_eq!(DateRange::parse(None, None).unwrap().bounds(), (None, None));
    }

    #[test]
    fn test_period_labels() {
        // 2024-03-14 is a Thursday.
        let t = at(2024, 3, 14, 15);
        assert_eq!(Period::Day.bucket_label(t), "2024-03-14");
        assert_eq!(Period::Week.bucket_label(t), "2024-03-11");
        assert_eq!(Period::Month.bucket_label(t), "2024-03");
        // Sunday belongs to the week that started the previous Monday.
        assert_eq!(Period::Week.bucket_label(at(2024, 3, 17, 23)), "2024-03-11");
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("week".parse::<Period>().unwrap(), Period::Week);
        assert_eq!(" MONTH ".parse::<Period>().unwrap(), Period::Month);
        assert!(matches!(
            "year".parse::<Period>(),
            Err(ValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_revenue_buckets_ascend() {
        let buckets = bucket_revenue(
            Period::Month,
            [
                (at(2024, 2, 3, 10), 500),
                (at(2024, 1, 20, 10), 1000),
                (at(2024, 1, 5, 10), 2001),
            ],
        );
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].period, "2024-01");
        assert_eq!(buckets[0].sales_count, 2);
        assert_eq!(buckets[0].total_revenue_cents, 3001);
        assert_eq!(buckets[0].avg_ticket_cents, 1501);
        assert_eq!(buckets[1].period, "2024-02");
    }

    #[test]
    fn test_inventory_partitions() {
        let status = InventoryStatus::from_products(
            vec![product("a", 40), product("b", 0), product("c", 10), product("d", 3)],
            10,
        );
        assert_eq!(status.total_products, 4);
        let low: Vec<_> = status
            .low_stock_alert
            .products
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(low, ["b", "d", "c"]);
        assert_eq!(status.low_stock_alert.count, 3);
        assert_eq!(status.out_of_stock.len(), 1);
        assert_eq!(status.out_of_stock[0].id, "b");
    }

    #[test]
    fn test_inventory_status_is_eq() {
        fn assert_eq_type<T: Eq>(_: &T) {}

        let status = InventoryStatus::from_products(vec![product("a", 0)], 5);
        assert_eq_type(&status);
        assert_eq!(status, status.clone());
    }

    #[test]
    fn test_turnover_ratio() {
        assert_eq!(turnover_ratio(10, 4), 2.5);
        assert_eq!(turnover_ratio(1, 3), 0.33);
        assert_eq!(turnover_ratio(7, 0), TURNOVER_SENTINEL);
    }

    #[test]
    fn test_rank_turnover() {
        let ranked = rank_turnover(
            vec![
                TurnoverEntry::new("a".into(), "A".into(), 10, 5),
                TurnoverEntry::new("b".into(), "B".into(), 0, 2),
                TurnoverEntry::new("c".into(), "C".into(), 5, 0),
                TurnoverEntry::new("d".into(), "D".into(), 1, 3),
            ],
            2,
        );
        let ids: Vec<_> = ranked.iter().map(|e| e.product_id.as_str()).collect();
        assert_eq!(ids, ["b", "d"]);
    }

    #[test]
    fn test_top_products_query() {
        assert_eq!(TopProductsQuery::default().limit, 10);
        assert!(TopProductsQuery::new(20, 0).is_ok());
        assert!(TopProductsQuery::new(21, 1).is_err());
        assert!(TopProductsQuery::new(5, -1).is_err());
    }
}
