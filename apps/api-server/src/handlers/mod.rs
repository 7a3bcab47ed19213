//! # HTTP Handlers
//!
//! One module per resource. Each handler extracts, calls ventas-db and
//! wraps the result in the `{message, data, count}` envelope.

pub mod clients;
pub mod health;
pub mod products;
pub mod sales;

use serde::Serialize;

/// Success envelope shared by every resource.
///
/// ```json
/// { "message": "Sale created successfully", "data": { ... } }
/// { "count": 2, "data": [ ... ] }
/// ```
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    pub data: T,
}

impl<T> Envelope<T> {
    pub fn with_message(message: &'static str, data: T) -> Self {
        Envelope {
            message: Some(message),
            count: None,
            data,
        }
    }

    pub fn data(data: T) -> Self {
        Envelope {
            message: None,
            count: None,
            data,
        }
    }
}

impl<T> Envelope<Vec<T>> {
    pub fn list(data: Vec<T>) -> Self {
        Envelope {
            message: None,
            count: Some(data.len()),
            data,
        }
    }
}
