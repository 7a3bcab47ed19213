//! # Client Handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::debug;
use ventas_core::{Client, NewClient};

use super::Envelope;
use crate::error::ApiResult;
use crate::AppState;

pub async fn create_client(
    State(state): State<AppState>,
    body: Result<Json<NewClient>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<Client>>)> {
    let Json(input) = body?;
    debug!(email = %input.email, "create_client");

    let client = state.db.clients().create(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message("Client created", client)),
    ))
}

pub async fn list_clients(State(state): State<AppState>) -> ApiResult<Json<Envelope<Vec<Client>>>> {
    let clients = state.db.clients().list().await?;
    Ok(Json(Envelope::list(clients)))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Client>>> {
    let client = state.db.clients().get(&id).await?;
    Ok(Json(Envelope::data(client)))
}
