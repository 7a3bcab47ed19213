//! # Checkout Math
//!
//! Pure building blocks of sale creation: the request shape, its validation,
//! and the priced lines that become `SaleLine` rows.
//!
//! ## Flow
//! ```text
//! SaleRequest ──validate()──► for each item (input order):
//!                                 product lookup      (ventas-db)
//!                                 stock check         (inventory::ensure_available)
//!                                 PricedLine::price() ← snapshot of product price
//!                                 SaleDraft::push()   ← running total
//!                             ──► SaleDraft { lines, total }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Product;
use crate::validation::{require_non_empty, validate_quantity, ValidationResult};

// =============================================================================
// Request
// =============================================================================

/// One requested product and quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// A request to record a sale for a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub client_id: String,
    #[serde(default, alias = "products")]
    pub items: Vec<SaleItemRequest>,
}

impl SaleRequest {
    /// Builds a request from `(product_id, quantity)` pairs.
    pub fn new<I, S>(client_id: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        SaleRequest {
            client_id: client_id.into(),
            items: items
                .into_iter()
                .map(|(product_id, quantity)| SaleItemRequest {
                    product_id: product_id.into(),
                    quantity,
                })
                .collect(),
        }
    }

    /// Checks the request shape before any store access.
    ///
    /// ## Rules
    /// - client id present
    /// - at least one item
    /// - every item names a product and has quantity > 0
    pub fn validate(&self) -> ValidationResult<()> {
        require_non_empty("client_id", &self.client_id)?;

        if self.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            });
        }

        for item in &self.items {
            require_non_empty("product_id", &item.product_id)?;
            validate_quantity(item.quantity)?;
        }

        Ok(())
    }
}

// =============================================================================
// Priced Lines
// =============================================================================

/// A line priced against the product as it is right now.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: String,
    pub quantity: i64,
    /// Snapshot of `product.price_cents`.
    pub unit_price: Money,
    pub subtotal: Money,
}

impl PricedLine {
    /// Prices `quantity` units of `product`.
    ///
    /// ## Errors
    /// `ValidationError::OutOfRange` when the subtotal does not fit in cents.
    pub fn price(product: &Product, quantity: i64) -> CoreResult<Self> {
        let unit_price = product.price();
        let subtotal = unit_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| amount_overflow("subtotal"))?;

        Ok(PricedLine {
            product_id: product.id.clone(),
            quantity,
            unit_price,
            subtotal,
        })
    }
}

/// Lines accumulated so far for one sale, with their running total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaleDraft {
    lines: Vec<PricedLine>,
    total: Money,
}

impl SaleDraft {
    pub fn new() -> Self {
        SaleDraft::default()
    }

    /// Appends a line and adds its subtotal to the total.
    pub fn push(&mut self, line: PricedLine) -> CoreResult<()> {
        self.total = self
            .total
            .checked_add(line.subtotal)
            .ok_or_else(|| amount_overflow("total"))?;
        self.lines.push(line);
        Ok(())
    }

    pub fn lines(&self) -> &[PricedLine] {
        &self.lines
    }

    pub fn total(&self) -> Money {
        self.total
    }
}

fn amount_overflow(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================
