//! # Sale Transaction Workflow
//!
//! Creates and cancels sales. Each call is one unit of work: either every
//! stock change and row it makes is committed, or none is.
//!
//! ## create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request.validate()                          ValidationError           │
//! │  BEGIN                                                                 │
//! │  client lookup                               ClientNotFound            │
//! │  for item in request.items (input order):                              │
//! │      product lookup (sees earlier decrements) ProductNotFound          │
//! │      ensure_available(product, qty)          InsufficientStock         │
//! │      PricedLine::price → draft.push                                    │
//! │      take_stock (guarded UPDATE)             InsufficientStock (race)  │
//! │  insert sale (completed, clock.now()) + lines                          │
//! │  COMMIT                                      any error ⇒ ROLLBACK      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## cancel
//! ```text
//! BEGIN → sale lookup (SaleNotFound) → status.ensure_cancellable (AlreadyCancelled)
//!       → guarded status flip (AlreadyCancelled if a concurrent cancel won)
//!       → restore_stock per line (missing product = skipped)
//!       → COMMIT
//! ```

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;
use ventas_core::inventory::ensure_available;
use ventas_core::{
    Clock, CoreError, PricedLine, Sale, SaleDetail, SaleDraft, SaleLine, SaleRequest, SaleStatus,
};

use crate::error::{DbError, ServiceError, ServiceResult};
use crate::inventory::{restore_stock, take_stock};
use crate::repository::{client, product, sale};
use crate::unit_of_work::UnitOfWork;

/// The sale lifecycle over one pool and one clock.
#[derive(Debug, Clone)]
pub struct SaleWorkflow {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SaleWorkflow {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        SaleWorkflow { pool, clock }
    }

    /// Records a sale, taking stock for every item.
    ///
    /// ## Errors
    /// - `ValidationError`: no items, blank ids, quantity <= 0
    /// - `ClientNotFound` / `ProductNotFound`
    /// - `InsufficientStock`: the first item that cannot be covered
    /// - `Store`: persistence failure (including a busy database)
    ///
    /// On any error the store is left exactly as it was.
    pub async fn create(&self, request: &SaleRequest) -> ServiceResult<SaleDetail> {
        request.validate()?;

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        match self.create_in(&mut uow, request).await {
            Ok(detail) => {
                uow.commit().await?;
                debug!(
                    sale_id = %detail.sale.id,
                    lines = detail.lines.len(),
                    total = %detail.sale.total(),
                    "Sale created"
                );
                Ok(detail)
            }
            Err(e) => {
                uow.abandon(&e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn create_in(
        &self,
        uow: &mut UnitOfWork,
        request: &SaleRequest,
    ) -> ServiceResult<SaleDetail> {
        let now = self.clock.now();

        let client = client::fetch(uow.conn(), &request.client_id)
            .await?
            .ok_or_else(|| CoreError::ClientNotFound(request.client_id.clone()))?;

        let mut draft = SaleDraft::new();
        for item in &request.items {
            let product = product::fetch(uow.conn(), &item.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;

            ensure_available(&product, item.quantity)?;
            draft.push(PricedLine::price(&product, item.quantity)?)?;

            if !take_stock(uow.conn(), &product.id, item.quantity, now).await? {
                // Someone else took the units between our read and our write.
                let available = product::fetch(uow.conn(), &product.id)
                    .await?
                    .map_or(0, |p| p.stock);
                return Err(CoreError::InsufficientStock {
                    product_id: product.id,
                    available,
                    requested: item.quantity,
                }
                .into());
            }
        }

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            client_id: client.id.clone(),
            total_cents: draft.total().cents(),
            status: SaleStatus::Completed,
            sold_at: now,
            created_at: now,
            updated_at: now,
        };
        sale::insert_sale(uow.conn(), &sale).await?;

        for (position, priced) in draft.lines().iter().enumerate() {
            let line = SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: priced.product_id.clone(),
                position: position as i64,
                quantity: priced.quantity,
                unit_price_cents: priced.unit_price.cents(),
                subtotal_cents: priced.subtotal.cents(),
            };
            sale::insert_line(uow.conn(), &line).await?;
        }

        let detail = sale::fetch_detail(uow.conn(), &sale.id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", &sale.id))?;

        Ok(detail)
    }

    /// Cancels a sale and gives its stock back.
    ///
    /// ## Errors
    /// - `SaleNotFound`
    /// - `AlreadyCancelled`: stock was already restored by the first cancel
    /// - `Store`: persistence failure
    ///
    /// A line whose product has since been deleted is skipped.
    pub async fn cancel(&self, sale_id: &str) -> ServiceResult<SaleDetail> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        match self.cancel_in(&mut uow, sale_id).await {
            Ok(detail) => {
                uow.commit().await?;
                debug!(sale_id = %sale_id, "Sale cancelled");
                Ok(detail)
            }
            Err(e) => {
                uow.abandon(&e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn cancel_in(&self, uow: &mut UnitOfWork, sale_id: &str) -> ServiceResult<SaleDetail> {
        let now = self.clock.now();

        let current = sale::fetch_sale(uow.conn(), sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        current.status.ensure_cancellable(sale_id)?;

        if !sale::mark_cancelled(uow.conn(), sale_id, now).await? {
            return Err(CoreError::AlreadyCancelled(sale_id.to_string()).into());
        }

        let lines = sale::fetch_lines(uow.conn(), sale_id).await?;
        let mut skipped = 0usize;
        for line in &lines {
            if !restore_stock(uow.conn(), &line.product_id, line.quantity, now).await? {
                skipped += 1;
            }
        }
        if skipped > 0 {
            debug!(sale_id = %sale_id, skipped, "Some lines referenced deleted products");
        }

        let detail = sale::fetch_detail(uow.conn(), sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        Ok(detail)
    }

    /// Gets a sale with its client and lines.
    ///
    /// ## Errors
    /// - `SaleNotFound`
    pub async fn get_by_id(&self, sale_id: &str) -> ServiceResult<SaleDetail> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        sale::fetch_detail(&mut conn, sale_id)
            .await?
            .ok_or_else(|| ServiceError::from(CoreError::SaleNotFound(sale_id.to_string())))
    }

    /// All sales, most recent first.
    pub async fn list_all(&self) -> ServiceResult<Vec<SaleDetail>> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Ok(sale::list_details(&mut conn).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{TimeZone, Utc};
    use ventas_core::{FixedClock, NewClient, NewProduct};

    async fn setup() -> (Database, String, String) {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let db = Database::new(DbConfig::in_memory())
            .await
            .unwrap()
            .with_clock(Arc::new(FixedClock::new(at)));
        let client = db
            .clients()
            .create(&NewClient {
                name: "Ana".into(),
                email: "ana@example.com".into(),
                phone: None,
                address: None,
            })
            .await
            .unwrap();
        let product = db
            .products()
            .create(&NewProduct {
                name: "Teclado".into(),
                description: None,
                price_cents: 1_000,
                stock: 5,
                image_url: None,
            })
            .await
            .unwrap();
        (db, client.id, product.id)
    }

    #[tokio::test]
    async fn test_create_uses_clock_and_status() {
        let (db, client_id, product_id) = setup().await;
        let detail = db
            .workflow()
            .create(&SaleRequest::new(&client_id, [(&product_id, 2)]))
            .await
            .unwrap();

        assert_eq!(detail.sale.status, SaleStatus::Completed);
        assert_eq!(detail.sale.sold_at, db.clock().now());
        assert_eq!(detail.sale.total_cents, 2_000);
        assert_eq!(detail.client.name, "Ana");
        assert_eq!(detail.lines[0].product.as_ref().unwrap().name, "Teclado");
    }

    #[tokio::test]
    async fn test_validation_happens_before_store_access() {
        let (db, _, product_id) = setup().await;
        // Unknown client, but the empty item list is reported first.
        let err = db
            .workflow()
            .create(&SaleRequest::new("nope", Vec::<(String, i64)>::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::Validation(_))));

        let err = db
            .workflow()
            .create(&SaleRequest::new("nope", [(&product_id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::ClientNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_and_cancel_run_on_spawned_tasks() {
        fn assert_send<T: Send>(_: &T) {}

        let (db, client_id, product_id) = setup().await;
        let workflow = db.workflow();
        let request = SaleRequest::new(&client_id, [(&product_id, 1)]);

        let create = workflow.create(&request);
        assert_send(&create);
        drop(create);

        let sale = tokio::spawn({
            let workflow = workflow.clone();
            async move { workflow.create(&request).await }
        })
        .await
        .unwrap()
        .unwrap();

        let cancelled = tokio::spawn(async move { workflow.cancel(&sale.sale.id).await })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.sale.status, SaleStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_get_missing_sale() {
        let (db, _, _) = setup().await;
        assert!(matches!(
            db.workflow().get_by_id("nope").await,
            Err(ServiceError::Domain(CoreError::SaleNotFound(_)))
        ));
        assert!(matches!(
            db.workflow().cancel("nope").await,
            Err(ServiceError::Domain(CoreError::SaleNotFound(_)))
        ));
    }
}
