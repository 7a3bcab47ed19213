//! # ventas-db: Database Layer for Ventas
//!
//! This crate provides store access for Ventas: the SQLite pool, the
//! repositories, the transactional sale workflow and the analytics reports.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ventas Data Flow                                 │
//! │                                                                         │
//! │  POST /api/sales  or  tools/call get_top_products                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     ventas-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌────────────────┐   │   │
//! │  │   │   Database    │   │  SaleWorkflow │   │ ReportRepo     │   │   │
//! │  │   │   (pool.rs)   │   │ (workflow.rs) │   │ (read-only)    │   │   │
//! │  │   │               │   │               │   │                │   │   │
//! │  │   │ SqlitePool    │◄──│ UnitOfWork    │   │ summaries,     │   │   │
//! │  │   │ Clock         │   │ inventory     │   │ rankings,      │   │   │
//! │  │   │ Migrations    │   │ repositories  │   │ custom query   │   │   │
//! │  │   └───────────────┘   └───────────────┘   └────────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (./ventas.db by default)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and service error types
//! - [`unit_of_work`] - Transaction wrapper with explicit commit/rollback
//! - [`inventory`] - Guarded stock decrement and restoration
//! - [`repository`] - Client, product, sale and report repositories
//! - [`workflow`] - Sale create / cancel / fetch
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ventas_db::{Database, DbConfig};
//! use ventas_core::SaleRequest;
//!
//! let db = Database::new(DbConfig::new("./ventas.db")).await?;
//!
//! let sale = db
//!     .workflow()
//!     .create(&SaleRequest::new(client_id, [(product_id, 2)]))
//!     .await?;
//!
//! let top = db.reports().top_products(Default::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod inventory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;
pub mod workflow;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use pool::{Database, DbConfig};
pub use unit_of_work::UnitOfWork;
pub use workflow::SaleWorkflow;

// Repository re-exports for convenience
pub use repository::client::ClientRepository;
pub use repository::product::ProductRepository;
pub use repository::report::{JsonRow, ReportRepository};
pub use repository::sale::SaleRepository;
