//! # Product Handlers
//!
//! Deleting a product is a hard delete. Sale lines keep their price snapshot
//! and show the product as `null` afterwards.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::{debug, info};
use ventas_core::{NewProduct, Product};

use super::Envelope;
use crate::error::ApiResult;
use crate::AppState;

pub async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<Product>>)> {
    let Json(input) = body?;
    debug!(name = %input.name, "create_product");

    let product = state.db.products().create(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message("Product created", product)),
    ))
}

pub async fn list_products(
    State(state): State<AppState>,
) -> ApiResult<Json<Envelope<Vec<Product>>>> {
    let products = state.db.products().list().await?;
    Ok(Json(Envelope::list(products)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Product>>> {
    let product = state.db.products().get(&id).await?;
    Ok(Json(Envelope::data(product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Value>>> {
    state.db.products().delete(&id).await?;
    info!(product_id = %id, "Product deleted");
    Ok(Json(Envelope::with_message(
        "Product deleted",
        json!({ "id": id }),
    )))
}
