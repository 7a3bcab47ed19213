//! # Sale Handlers
//!
//! ## Request Flow
//! ```text
//! POST /api/sales {"client_id": "...", "products": [{"product_id", "quantity"}]}
//!      │
//!      ▼
//! SaleWorkflow::create ── one unit of work ──► 201 {message, data: SaleDetail}
//!      │
//!      └─ any failure: rolled back, mapped to 400 / 404 / 409 / 500
//!
//! DELETE /api/sales/{id}/cancel
//!      │
//!      ▼
//! SaleWorkflow::cancel ── status flip + stock restore ──► 200 {message, data}
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{debug, info};
use ventas_core::{SaleDetail, SaleRequest};

use super::Envelope;
use crate::error::ApiResult;
use crate::AppState;

pub async fn create_sale(
    State(state): State<AppState>,
    body: Result<Json<SaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<SaleDetail>>)> {
    let Json(request) = body?;
    debug!(client_id = %request.client_id, items = request.items.len(), "create_sale");

    let sale = state.db.workflow().create(&request).await?;
    info!(sale_id = %sale.sale.id, total_cents = sale.sale.total_cents, "Sale created");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message("Sale created successfully", sale)),
    ))
}

pub async fn list_sales(State(state): State<AppState>) -> ApiResult<Json<Envelope<Vec<SaleDetail>>>> {
    let sales = state.db.workflow().list_all().await?;
    Ok(Json(Envelope::list(sales)))
}

pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<SaleDetail>>> {
    let sale = state.db.workflow().get_by_id(&id).await?;
    Ok(Json(Envelope::data(sale)))
}

pub async fn cancel_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<SaleDetail>>> {
    let sale = state.db.workflow().cancel(&id).await?;
    info!(sale_id = %id, "Sale cancelled");
    Ok(Json(Envelope::with_message("Sale cancelled successfully", sale)))
}
