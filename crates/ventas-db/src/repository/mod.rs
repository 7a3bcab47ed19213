//! # Repository Module
//!
//! Database repository implementations for Ventas.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Handler / tool                                                        │
//! │       │  db.products().get_by_id(id)                                   │
//! │       ▼                                                                 │
//! │  ProductRepository (owns a pool clone)                                 │
//! │       │  acquires a connection, then calls                             │
//! │       ▼                                                                 │
//! │  product::fetch(conn, id)   ◄── also called by the sale workflow       │
//! │       │                          with its transaction's connection     │
//! │       ▼                                                                 │
//! │  SQLite                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every statement lives in a free function taking `&mut SqliteConnection`,
//! so the same SQL runs on a pooled connection or inside a unit of work.
//!
//! ## Available Repositories
//!
//! - [`client::ClientRepository`] - Client registration and lookup
//! - [`product::ProductRepository`] - Product CRUD
//! - [`sale::SaleRepository`] - Sale read side (details, listings)
//! - [`report::ReportRepository`] - Read-only analytics

pub mod client;
pub mod product;
pub mod report;
pub mod sale;
