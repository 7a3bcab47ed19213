//! # Ventas MCP Server
//!
//! Read-only analytics tools for AI assistants, spoken over stdio.
//!
//! ## Module Organization
//!
//! - [`protocol`] - JSON-RPC 2.0 framing and method dispatch
//! - [`tools`] - Tool catalog and the report calls behind each tool
//! - [`error`] - Tool error payloads
//! - [`config`] - Database settings

pub mod config;
pub mod error;
pub mod protocol;
pub mod tools;

pub use error::ToolError;
pub use protocol::Server;
pub use tools::ToolBox;
