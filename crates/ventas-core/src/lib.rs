//! # ventas-core: Pure Business Logic for Ventas
//!
//! This crate holds the domain model and every rule that can be expressed
//! without touching a database: sale line math, stock sufficiency, input
//! validation, report parameters and the custom query gate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Ventas Architecture                             │
//! │                                                                         │
//! │  ┌──────────────────────────┐       ┌──────────────────────────────┐   │
//! │  │   api-server (REST)      │       │   mcp-server (stdio tools)   │   │
//! │  └────────────┬─────────────┘       └──────────────┬───────────────┘   │
//! │               │                                    │                    │
//! │  ┌────────────▼────────────────────────────────────▼───────────────┐   │
//! │  │                ventas-db (workflow, reports, SQLite)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ventas-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   types     money     checkout    inventory    query_gate      │   │
//! │  │   report    validation    clock    error                       │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Client, Product, Sale, SaleLine)
//! - [`money`] - Money type with integer arithmetic
//! - [`checkout`] - Sale requests, priced lines and totals
//! - [`inventory`] - Stock sufficiency rules
//! - [`query_gate`] - Shape filter for free-text SELECT queries
//! - [`report`] - Report parameters and result shapes
//! - [`validation`] - Input validation
//! - [`clock`] - Injectable time source
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use ventas_core::query_gate;
//!
//! assert!(query_gate::validate("SELECT * FROM sales").is_ok());
//! assert!(query_gate::validate("SELECT 1; DROP TABLE sales").is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod clock;
pub mod error;
pub mod inventory;
pub mod money;
pub mod query_gate;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{PricedLine, SaleDraft, SaleItemRequest, SaleRequest};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ErrorClass, ValidationError};
pub use money::Money;
pub use query_gate::QueryRejection;
pub use types::*;
