//! # Ventas API Server
//!
//! REST transport over the ventas-db workflow and repositories.
//!
//! ## Routes
//! ```text
//! ┌────────────────────────────────┬────────┬──────────────────────────────┐
//! │ Path                           │ Method │ Operation                    │
//! ├────────────────────────────────┼────────┼──────────────────────────────┤
//! │ /health                        │ GET    │ store health                 │
//! │ /api/clients                   │ POST   │ create client                │
//! │ /api/clients                   │ GET    │ list clients                 │
//! │ /api/clients/{id}              │ GET    │ get client                   │
//! │ /api/products                  │ POST   │ create product               │
//! │ /api/products                  │ GET    │ list products                │
//! │ /api/products/{id}             │ GET    │ get product                  │
//! │ /api/products/{id}             │ DELETE │ delete product               │
//! │ /api/sales                     │ POST   │ SaleWorkflow::create         │
//! │ /api/sales                     │ GET    │ SaleWorkflow::list_all       │
//! │ /api/sales/{id}                │ GET    │ SaleWorkflow::get_by_id      │
//! │ /api/sales/{id}/cancel         │ DELETE │ SaleWorkflow::cancel         │
//! └────────────────────────────────┴────────┴──────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use ventas_db::Database;

use crate::handlers::{clients, health, products, sales};

/// Shared application state. `Database` is a cheap handle over the pool.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

/// Builds the full router with tracing and CORS layers.
pub fn router(db: Database) -> Router {
    let api = Router::new()
        .route(
            "/clients",
            get(clients::list_clients).post(clients::create_client),
        )
        .route("/clients/{id}", get(clients::get_client))
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/{id}",
            get(products::get_product).delete(products::delete_product),
        )
        .route("/sales", get(sales::list_sales).post(sales::create_sale))
        .route("/sales/{id}", get(sales::get_sale))
        .route("/sales/{id}/cancel", delete(sales::cancel_sale));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { db })
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;
    use ventas_db::DbConfig;

    async fn app() -> Router {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        router(db)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn seed(app: &Router) -> (String, String) {
        let (status, client) = send(
            app,
            Method::POST,
            "/api/clients",
            Some(json!({ "name": "Ana", "email": "ana@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, product) = send(
            app,
            Method::POST,
            "/api/products",
            Some(json!({ "name": "Monitor", "price_cents": 250_000, "stock": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        (
            client["data"]["id"].as_str().unwrap().to_string(),
            product["data"]["id"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_sale_lifecycle() {
        let app = app().await;
        let (client_id, product_id) = seed(&app).await;

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/sales",
            Some(json!({
                "client_id": client_id,
                "products": [{ "product_id": product_id, "quantity": 3 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["message"], "Sale created successfully");
        assert_eq!(created["data"]["total_cents"], 750_000);
        assert_eq!(created["data"]["status"], "completed");
        let sale_id = created["data"]["id"].as_str().unwrap().to_string();

        let (status, conflict) = send(
            &app,
            Method::POST,
            "/api/sales",
            Some(json!({
                "client_id": client_id,
                "items": [{ "product_id": product_id, "quantity": 3 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(conflict["code"], "INSUFFICIENT_STOCK");

        let (_, listed) = send(&app, Method::GET, "/api/sales", None).await;
        assert_eq!(listed["count"], 1);

        let uri = format!("/api/sales/{}/cancel", sale_id);
        let (status, cancelled) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["data"]["status"], "cancelled");

        let (status, again) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(again["code"], "ALREADY_CANCELLED");

        let (_, product) = send(&app, Method::GET, &format!("/api/products/{}", product_id), None).await;
        assert_eq!(product["data"]["stock"], 5);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = app().await;
        let (client_id, _) = seed(&app).await;

        let (status, body) = send(&app, Method::GET, "/api/sales/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/sales",
            Some(json!({ "client_id": client_id, "products": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/clients",
            Some(json!({ "name": "Dup", "email": "ana@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::POST, "/api/products", Some(json!({ "name": 5 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = send(&app, Method::GET, "/api/nothing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Route not found");
    }

    #[tokio::test]
    async fn test_product_delete() {
        let app = app().await;
        let (_, product_id) = seed(&app).await;
        let uri = format!("/api/products/{}", product_id);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, listed) = send(&app, Method::GET, "/api/products", None).await;
        assert_eq!(listed["count"], 0);
    }
}
