//! # Inventory Rules
//!
//! The pure half of the inventory ledger. The store half (atomic
//! conditional decrement, restoration) lives in `ventas_db::inventory`.
//!
//! ```text
//! stock ──ensure_available(qty)──► stock - qty   (never below zero)
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::Product;

/// Checks that `requested` units can be taken from `product`.
///
/// Returns the stock that would remain.
///
/// ## Errors
/// `InsufficientStock` carrying requested and available units.
pub fn ensure_available(product: &Product, requested: i64) -> CoreResult<i64> {
    if requested > product.stock {
        return Err(CoreError::InsufficientStock {
            product_id: product.id.clone(),
            available: product.stock,
            requested,
        });
    }

    Ok(product.stock - requested)
}
