//! Shared fixtures for the ventas-db integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use ventas_core::{Client, FixedClock, NewClient, NewProduct, Product, SaleDetail, SaleRequest};
use ventas_db::{Database, DbConfig};

/// A fresh in-memory store whose clock reads 2024-06-15 12:00 UTC.
pub async fn store() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .unwrap()
        .with_clock(Arc::new(FixedClock::new(at(2024, 6, 15, 12))))
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub async fn client(db: &Database, name: &str, email: &str) -> Client {
    db.clients()
        .create(&NewClient {
            name: name.into(),
            email: email.into(),
            phone: None,
            address: None,
        })
        .await
        .unwrap()
}

pub async fn product(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
    db.products()
        .create(&NewProduct {
            name: name.into(),
            description: None,
            price_cents,
            stock,
            image_url: None,
        })
        .await
        .unwrap()
}

pub async fn stock_of(db: &Database, product_id: &str) -> i64 {
    db.products()
        .get_by_id(product_id)
        .await
        .unwrap()
        .unwrap()
        .stock
}

/// Records a sale as if it happened at `when`.
pub async fn sale_at(
    db: &Database,
    when: DateTime<Utc>,
    client_id: &str,
    items: &[(&str, i64)],
) -> SaleDetail {
    db.clone()
        .with_clock(Arc::new(FixedClock::new(when)))
        .workflow()
        .create(&SaleRequest::new(client_id, items.iter().copied()))
        .await
        .unwrap()
}
