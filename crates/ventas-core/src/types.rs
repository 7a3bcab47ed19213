//! # Domain Types
//!
//! Core domain types used throughout Ventas.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Client      │   │      Sale       │   │    SaleLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  client_id      │◄──│  sale_id        │       │
//! │  │  name           │   │  total_cents    │   │  product_id ────┼──┐    │
//! │  │  email (unique) │   │  status         │   │  quantity       │  │    │
//! │  └─────────────────┘   │  sold_at        │   │  unit_price     │  │    │
//! │                        └─────────────────┘   │  subtotal       │  │    │
//! │  ┌─────────────────┐                         └─────────────────┘  │    │
//! │  │    Product      │◄─────────────────────────────────────────────┘    │
//! │  │  ─────────────  │                                                    │
//! │  │  price_cents    │   SaleStatus: Pending | Completed | Cancelled     │
//! │  │  stock (>= 0)   │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A sale owns its lines. Lines copy the product price at the moment of
//! purchase and are never edited afterwards; only the parent sale's status
//! changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Client
// =============================================================================

/// A customer that sales are made to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Client {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Contact email, unique across clients.
    pub email: String,

    pub phone: Option<String>,

    pub address: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Returns the summary embedded in sale responses.
    pub fn summary(&self) -> ClientSummary {
        ClientSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Input for registering a client.
#[derive(Debug, Clone, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Client fields shown alongside a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Optional long description.
    pub description: Option<String>,

    /// Current price in cents. Sale lines snapshot this value.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Optional image location.
    pub image_url: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the summary embedded in sale line responses.
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Input for registering a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Product fields shown alongside a sale line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// ```text
///   Pending ───┐
///              ├──► Cancelled   (terminal, no way back)
///   Completed ─┘
/// ```
///
/// Sales created through the workflow start as `Completed`. `Pending` exists
/// for records imported or seeded from elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Recorded but not yet settled.
    Pending,
    /// Settled; stock has been taken.
    Completed,
    /// Cancelled; stock has been given back.
    Cancelled,
}

impl SaleStatus {
    /// Returns the stored string form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }

    /// Checks whether the sale can still move to `Cancelled`.
    ///
    /// ## Errors
    /// `AlreadyCancelled` when the sale is in its terminal state.
    pub fn ensure_cancellable(&self, sale_id: &str) -> CoreResult<()> {
        match self {
            SaleStatus::Cancelled => Err(CoreError::AlreadyCancelled(sale_id.to_string())),
            SaleStatus::Pending | SaleStatus::Completed => Ok(()),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale header. Its total is derived from its lines, never caller-supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning client.
    pub client_id: String,

    /// Σ line subtotals at creation time.
    pub total_cents: i64,

    pub status: SaleStatus,

    /// When the sale happened (from the injected clock).
    pub sold_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as a Money type.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// One product/quantity/price entry of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,

    pub sale_id: String,

    /// Product reference. The product row may have been deleted since.
    pub product_id: String,

    /// Zero-based position in the original request.
    pub position: i64,

    pub quantity: i64,

    /// Price of the product at the moment of purchase.
    pub unit_price_cents: i64,

    /// `unit_price_cents × quantity`.
    pub subtotal_cents: i64,
}

impl SaleLine {
    /// Returns the subtotal as a Money type.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A sale line with its resolved product summary.
///
/// `product` is `None` when the product has been deleted since the sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLineDetail {
    #[serde(flatten)]
    pub line: SaleLine,
    pub product: Option<ProductSummary>,
}

/// A sale with its client and lines, as returned by the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub client: ClientSummary,
    pub lines: Vec<SaleLineDetail>,
}

impl SaleDetail {
    /// Σ line subtotals. Equals `sale.total()` for every sale the workflow creates.
    pub fn lines_total(&self) -> Money {
        self.lines.iter().map(|l| l.line.subtotal()).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_transition() {
        assert!(SaleStatus::Pending.ensure_cancellable("s").is_ok());
        assert!(SaleStatus::Completed.ensure_cancellable("s").is_ok());
        assert!(matches!(
            SaleStatus::Cancelled.ensure_cancellable("s"),
            Err(CoreError::AlreadyCancelled(id)) if id == "s"
        ));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&SaleStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(SaleStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_sale_detail_flattens_header() {
        let now = Utc::now();
        let detail = SaleDetail {
            sale: Sale {
                id: "s-1".into(),
                client_id: "c-1".into(),
                total_cents: 600,
                status: SaleStatus::Completed,
                sold_at: now,
                created_at: now,
                updated_at: now,
            },
            client: ClientSummary {
                id: "c-1".into(),
                name: "Ana".into(),
                email: "ana@example.com".into(),
            },
            lines: vec![SaleLineDetail {
                line: SaleLine {
                    id: "l-1".into(),
                    sale_id: "s-1".into(),
                    product_id: "p-1".into(),
                    position: 0,
                    quantity: 3,
                    unit_price_cents: 200,
                    subtotal_cents: 600,
                },
                product: None,
            }],
        };

        assert_eq!(detail.lines_total(), detail.sale.total());

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["id"], "s-1");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["client"]["email"], "ana@example.com");
        assert_eq!(json["lines"][0]["quantity"], 3);
        assert!(json["lines"][0]["product"].is_null());
    }
}
