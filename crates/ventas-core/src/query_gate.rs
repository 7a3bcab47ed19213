//! # Custom Query Gate
//!
//! Decides whether a free-text query may be run against the store by the
//! analytics tool surface.
//!
//! ## Policy (first match wins)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. trim + uppercase (for the checks only, text runs unchanged)        │
//! │  2. must start with SELECT ............................ NotSelect       │
//! │  3. DROP DELETE TRUNCATE ALTER CREATE REPLACE GRANT REVOKE             │
//! │     as whole words ................................. DestructiveKeyword │
//! │     UNION SELECT / INSERT INTO / UPDATE <t> SET ...... InjectionShape   │
//! │     ; followed by DROP / DELETE / TRUNCATE ......... StackedStatement   │
//! │     --  #  /*  */ anywhere .......................... CommentMarker    │
//! │  4. longer than 2000 characters ........................ TooLong      │
//! │  5. accept                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Limitation
//! This is a shape filter, not a SQL parser. It blocks the enumerated attack
//! shapes and nothing more: an accepted query is not proven harmless, and a
//! harmless query can be refused (`SELECT replace(name, 'a', 'b') ...` trips
//! the REPLACE keyword). Stronger guarantees belong in fixed, parametrized
//! report shapes, not in a smarter filter here.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Longest query text accepted, in characters.
pub const MAX_QUERY_LENGTH: usize = 2000;

static DESTRUCTIVE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(DROP|DELETE|TRUNCATE|ALTER|CREATE|REPLACE|GRANT|REVOKE)\b")
        .expect("valid regex")
});

static INJECTION_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(UNION\s+SELECT|INSERT\s+INTO|UPDATE\s+\w+\s+SET)\b").expect("valid regex")
});

static STACKED_STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i);\s*(DROP|DELETE|TRUNCATE)").expect("valid regex"));

static COMMENT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--|#|/\*|\*/").expect("valid regex"));

/// Why the gate refused a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryRejection {
    /// The text does not begin with `SELECT` (empty text included).
    #[error("only SELECT queries are allowed")]
    NotSelect,

    /// A destructive DDL/DML keyword appears as a whole word.
    #[error("forbidden keyword {keyword}")]
    DestructiveKeyword { keyword: String },

    /// A compound injection shape such as `UNION SELECT`.
    #[error("forbidden construct {shape}")]
    InjectionShape { shape: String },

    /// A statement terminator followed by a destructive keyword.
    #[error("stacked destructive statement")]
    StackedStatement,

    /// A SQL comment marker.
    #[error("comment marker {marker} is not allowed")]
    CommentMarker { marker: String },

    /// The text exceeds [`MAX_QUERY_LENGTH`].
    #[error("query too long: {length} characters (max {max})")]
    TooLong { length: usize, max: usize },
}

impl QueryRejection {
    /// Stable machine-readable name of the violated rule.
    pub const fn rule(&self) -> &'static str {
        match self {
            QueryRejection::NotSelect => "not_select",
            QueryRejection::DestructiveKeyword { .. } => "destructive_keyword",
            QueryRejection::InjectionShape { .. } => "injection_shape",
            QueryRejection::StackedStatement => "stacked_statement",
            QueryRejection::CommentMarker { .. } => "comment_marker",
            QueryRejection::TooLong { .. } => "too_long",
        }
    }
}

/// Runs the gate over `raw`.
///
/// ```rust
/// use ventas_core::query_gate::{validate, QueryRejection};
///
/// assert!(validate("select * from sales").is_ok());
/// assert_eq!(validate("DELETE FROM products"), Err(QueryRejection::NotSelect));
/// ```
pub fn validate(raw: &str) -> Result<(), QueryRejection> {
    let normalized = raw.trim().to_uppercase();
    if !normalized.starts_with("SELECT") {
        return Err(QueryRejection::NotSelect);
    }

    if let Some(m) = DESTRUCTIVE_KEYWORD.find(raw) {
        return Err(QueryRejection::DestructiveKeyword {
            keyword: m.as_str().to_uppercase(),
        });
    }

    if let Some(m) = INJECTION_SHAPE.find(raw) {
        return Err(QueryRejection::InjectionShape {
            shape: m
                .as_str()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_uppercase(),
        });
    }

    if STACKED_STATEMENT.is_match(raw) {
        return Err(QueryRejection::StackedStatement);
    }

    if let Some(m) = COMMENT_MARKER.find(raw) {
        return Err(QueryRejection::CommentMarker {
            marker: m.as_str().to_string(),
        });
    }

    let length = raw.chars().count();
    if length > MAX_QUERY_LENGTH {
        return Err(QueryRejection::TooLong {
            length,
            max: MAX_QUERY_LENGTH,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
