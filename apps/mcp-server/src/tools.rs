//! # Analytics Tools
//!
//! The twelve read-only tools and their dispatcher.
//!
//! ## Tool Catalog
//! ```text
//! ┌───────────────────────────────────┬───────────────────────────────────────┐
//! │ Tool                              │ Arguments (defaults)                  │
//! ├───────────────────────────────────┼───────────────────────────────────────┤
//! │ get_sales_summary                 │ -                                     │
//! │ get_sales_by_date_range           │ start_date, end_date, page=1, limit=50│
//! │ get_top_products                  │ limit=10 (≤20), min_sales=1           │
//! │ get_revenue_by_period             │ period=day, start_date, end_date      │
//! │ search_sales                      │ search_term*, page=1, limit=50        │
//! │ get_inventory_status              │ low_stock_threshold=10                │
//! │ get_products_by_price_range       │ -                                     │
//! │ get_products_turnover             │ limit=10 (≤20)                        │
//! │ get_clients_summary               │ -                                     │
//! │ get_top_clients                   │ limit=10 (≤20)                        │
//! │ get_clients_by_purchase_frequency │ -                                     │
//! │ execute_custom_query              │ query*                                │
//! └───────────────────────────────────┴───────────────────────────────────────┘
//! ```
//!
//! Each tool returns a JSON value; the protocol layer renders it as pretty
//! text content.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use ventas_core::report::{
    DateRange, Pagination, Period, TopProductsQuery, DEFAULT_LOW_STOCK_THRESHOLD,
    DEFAULT_MIN_SALES, DEFAULT_PAGE, DEFAULT_PAGE_LIMIT, DEFAULT_TOP_LIMIT,
};
use ventas_core::{Clock, ValidationError};
use ventas_db::{Database, ReportRepository};

use crate::error::ToolError;

// =============================================================================
// Tool Definitions
// =============================================================================

/// A tool as advertised by `tools/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

fn no_arguments() -> Value {
    json!({ "type": "object", "properties": {}, "required": [] })
}

fn pagination_properties() -> (Value, Value) {
    (
        json!({ "type": "integer", "minimum": 1, "default": DEFAULT_PAGE }),
        json!({ "type": "integer", "minimum": 1, "maximum": 100, "default": DEFAULT_PAGE_LIMIT }),
    )
}

/// Every tool, in listing order.
pub fn catalog() -> Vec<Tool> {
    let (page, limit) = pagination_properties();
    let top_limit = json!({
        "type": "integer", "minimum": 1, "maximum": 20, "default": DEFAULT_TOP_LIMIT,
        "description": "Number of rows to return"
    });

    vec![
        Tool {
            name: "get_sales_summary",
            description: "Overall sales statistics: totals, average ticket, counts per status.",
            input_schema: no_arguments(),
        },
        Tool {
            name: "get_sales_by_date_range",
            description: "Sales between two dates (inclusive), newest first, paginated.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "start_date": { "type": "string", "format": "date", "description": "Start date (YYYY-MM-DD)" },
                    "end_date": { "type": "string", "format": "date", "description": "End date (YYYY-MM-DD)" },
                    "page": page,
                    "limit": limit,
                }
            }),
        },
        Tool {
            name: "get_top_products",
            description: "Best-selling products by revenue over completed sales.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": top_limit,
                    "min_sales": {
                        "type": "integer", "minimum": 0, "default": DEFAULT_MIN_SALES,
                        "description": "Minimum units sold to be included"
                    }
                }
            }),
        },
        Tool {
            name: "get_revenue_by_period",
            description: "Completed-sale revenue grouped by day, week or month.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "period": { "type": "string", "enum": ["day", "week", "month"], "default": "day" },
                    "start_date": { "type": "string", "format": "date" },
                    "end_date": { "type": "string", "format": "date" }
                }
            }),
        },
        Tool {
            name: "search_sales",
            description: "Search sales by client name, client email or sale id (partial, any case).",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "search_term": { "type": "string", "description": "Name, email or id fragment" },
                    "page": page,
                    "limit": limit,
                },
                "required": ["search_term"]
            }),
        },
        Tool {
            name: "get_inventory_status",
            description: "Stock levels with low-stock and out-of-stock alerts.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "low_stock_threshold": {
                        "type": "integer", "minimum": 0, "default": DEFAULT_LOW_STOCK_THRESHOLD,
                        "description": "Products at or below this stock are flagged"
                    }
                }
            }),
        },
        Tool {
            name: "get_products_by_price_range",
            description: "Products grouped into price bands.",
            input_schema: no_arguments(),
        },
        Tool {
            name: "get_products_turnover",
            description: "Products with the highest units sold per unit of stock.",
            input_schema: json!({
                "type": "object",
                "properties": { "limit": top_limit }
            }),
        },
        Tool {
            name: "get_clients_summary",
            description: "Client totals: new in the last 30 days, with and without purchases.",
            input_schema: no_arguments(),
        },
        Tool {
            name: "get_top_clients",
            description: "Clients ranked by total spent on completed sales.",
            input_schema: json!({
                "type": "object",
                "properties": { "limit": top_limit }
            }),
        },
        Tool {
            name: "get_clients_by_purchase_frequency",
            description: "Clients grouped by number of completed purchases.",
            input_schema: no_arguments(),
        },
        Tool {
            name: "execute_custom_query",
            description: "Run a single read-only SELECT query.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "A SELECT statement; no writes, comments or stacked statements" }
                },
                "required": ["query"]
            }),
        },
    ]
}

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Deserialize)]
struct DateRangeArgs {
    start_date: Option<String>,
    end_date: Option<String>,
}

impl DateRangeArgs {
    fn range(&self) -> Result<DateRange, ValidationError> {
        DateRange::parse(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct PageArgs {
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default = "default_page_limit")]
    limit: i64,
}

impl PageArgs {
    fn pagination(&self) -> Result<Pagination, ValidationError> {
        Pagination::new(self.page, self.limit)
    }
}

#[derive(Debug, Deserialize)]
struct SalesByDateArgs {
    #[serde(flatten)]
    range: DateRangeArgs,
    #[serde(flatten)]
    page: PageArgs,
}

#[derive(Debug, Deserialize)]
struct TopProductsArgs {
    #[serde(default = "default_top_limit")]
    limit: i64,
    #[serde(default = "default_min_sales")]
    min_sales: i64,
}

#[derive(Debug, Deserialize)]
struct RevenueArgs {
    period: Option<String>,
    #[serde(flatten)]
    range: DateRangeArgs,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    #[serde(default)]
    search_term: String,
    #[serde(flatten)]
    page: PageArgs,
}

#[derive(Debug, Deserialize)]
struct InventoryArgs {
    #[serde(default = "default_threshold")]
    low_stock_threshold: i64,
}

#[derive(Debug, Deserialize)]
struct LimitArgs {
    #[serde(default = "default_top_limit")]
    limit: i64,
}

#[derive(Debug, Deserialize)]
struct QueryArgs {
    #[serde(default)]
    query: String,
}

fn default_page() -> i64 {
    DEFAULT_PAGE
}

fn default_page_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

fn default_top_limit() -> i64 {
    DEFAULT_TOP_LIMIT
}

fn default_min_sales() -> i64 {
    DEFAULT_MIN_SALES
}

fn default_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

/// Missing or `null` arguments mean "all defaults".
fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    let args = if args.is_null() { json!({}) } else { args };
    Ok(serde_json::from_value(args)?)
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Runs tools against a database handle.
#[derive(Debug, Clone)]
pub struct ToolBox {
    db: Database,
}

impl ToolBox {
    pub fn new(db: Database) -> Self {
        ToolBox { db }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    fn reports(&self) -> ReportRepository {
        self.db.reports()
    }

    fn generated_at(&self) -> String {
        self.db.clock().now().to_rfc3339()
    }

    /// Calls `name` with `args`.
    ///
    /// ## Errors
    /// - `UnknownTool` for a name outside the catalog
    /// - `InvalidArguments` when `args` does not fit the schema
    /// - `Service` for validation, gate and store failures
    pub async fn call(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        debug!(tool = name, "Calling tool");

        let value = match name {
            // === Sales ===
            "get_sales_summary" => {
                let summary = self.reports().sales_summary().await?;
                json!({ "summary": summary, "generated_at": self.generated_at() })
            }
            "get_sales_by_date_range" => {
                let args: SalesByDateArgs = parse_args(args)?;
                let page = self
                    .reports()
                    .sales_by_date_range(args.range.range()?, args.page.pagination()?)
                    .await?;
                serde_json::to_value(page)?
            }
            "get_top_products" => {
                let args: TopProductsArgs = parse_args(args)?;
                let query = TopProductsQuery::new(args.limit, args.min_sales)?;
                let products = self.reports().top_products(query).await?;
                json!({
                    "top_products": products,
                    "criteria": query,
                    "generated_at": self.generated_at(),
                })
            }
            "get_revenue_by_period" => {
                let args: RevenueArgs = parse_args(args)?;
                let period = match args.period.as_deref() {
                    Some(raw) => raw.parse::<Period>()?,
                    None => Period::default(),
                };
                let report = self
                    .reports()
                    .revenue_by_period(period, args.range.range()?)
                    .await?;
                serde_json::to_value(report)?
            }
            "search_sales" => {
                let args: SearchArgs = parse_args(args)?;
                let results = self
                    .reports()
                    .search_sales(&args.search_term, args.page.pagination()?)
                    .await?;
                serde_json::to_value(results)?
            }

            // === Products ===
            "get_inventory_status" => {
                let args: InventoryArgs = parse_args(args)?;
                let status = self
                    .reports()
                    .inventory_status(args.low_stock_threshold)
                    .await?;
                serde_json::to_value(status)?
            }
            "get_products_by_price_range" => {
                let ranges = self.reports().products_by_price_range().await?;
                json!({ "price_ranges": ranges })
            }
            "get_products_turnover" => {
                let args: LimitArgs = parse_args(args)?;
                let products = self.reports().product_turnover(args.limit).await?;
                json!({
                    "high_turnover_products": products,
                    "note": "turnover_ratio = units sold / current stock (higher = faster rotation)",
                    "limit": args.limit,
                })
            }

            // === Clients ===
            "get_clients_summary" => {
                let summary = self.reports().clients_summary().await?;
                json!({ "summary": summary, "generated_at": self.generated_at() })
            }
            "get_top_clients" => {
                let args: LimitArgs = parse_args(args)?;
                let clients = self.reports().top_clients(args.limit).await?;
                json!({
                    "top_clients": clients,
                    "criteria": { "status": "completed", "order_by": "total_spent" },
                    "limit": args.limit,
                })
            }
            "get_clients_by_purchase_frequency" => {
                let groups = self.reports().clients_by_purchase_frequency().await?;
                json!({
                    "frequency_distribution": groups,
                    "generated_at": self.generated_at(),
                })
            }

            // === Custom query ===
            "execute_custom_query" => {
                let args: QueryArgs = parse_args(args)?;
                let rows = self.reports().execute_custom_query(&args.query).await?;
                Value::Array(rows.into_iter().map(Value::Object).collect())
            }

            other => return Err(ToolError::UnknownTool(other.to_string())),
        };

        Ok(value)
    }
}
