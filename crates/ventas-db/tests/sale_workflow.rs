//! Integration tests for the sale workflow: atomic creation, stock
//! bookkeeping and cancellation.

mod common;

use std::sync::Arc;

use common::{at, client, product, sale_at, stock_of, store};
use ventas_core::{CoreError, SaleRequest, SaleStatus};
use ventas_db::{Database, DbConfig, ServiceError};

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn total_is_sum_of_line_subtotals() {
    let db = store().await;
    let ana = client(&db, "Ana", "ana@example.com").await;
    let mouse = product(&db, "Mouse", 1_999, 10).await;
    let cable = product(&db, "Cable", 350, 10).await;
    let free = product(&db, "Sticker", 0, 10).await;

    let detail = db
        .workflow()
        .create(&SaleRequest::new(
            &ana.id,
            [(&mouse.id, 2), (&cable.id, 3), (&free.id, 1)],
        ))
        .await
        .unwrap();

    assert_eq!(detail.sale.total_cents, 2 * 1_999 + 3 * 350);
    assert_eq!(detail.lines_total(), detail.sale.total());
    assert_eq!(detail.lines.len(), 3);

    // Lines keep request order and the price at the moment of purchase.
    let positions: Vec<_> = detail.lines.iter().map(|l| l.line.position).collect();
    assert_eq!(positions, [0, 1, 2]);
    assert_eq!(detail.lines[0].line.unit_price_cents, 1_999);
    assert_eq!(detail.lines[1].line.subtotal_cents, 1_050);

    assert_eq!(stock_of(&db, &mouse.id).await, 8);
    assert_eq!(stock_of(&db, &cable.id).await, 7);

    let fetched = db.workflow().get_by_id(&detail.sale.id).await.unwrap();
    assert_eq!(fetched, detail);
}

#[tokio::test]
async fn stock_five_then_three_then_three() {
    let db = store().await;
    let ana = client(&db, "Ana", "ana@example.com").await;
    let p = product(&db, "Monitor", 250_000, 5).await;

    db.workflow()
        .create(&SaleRequest::new(&ana.id, [(&p.id, 3)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&db, &p.id).await, 2);

    let err = db
        .workflow()
        .create(&SaleRequest::new(&ana.id, [(&p.id, 3)]))
        .await
        .unwrap_err();

    match err {
        ServiceError::Domain(CoreError::InsufficientStock {
            product_id,
            available,
            requested,
        }) => {
            assert_eq!(product_id, p.id);
            assert_eq!(available, 2);
            assert_eq!(requested, 3);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(stock_of(&db, &p.id).await, 2);
    assert_eq!(db.sales().count().await.unwrap(), 1);
}

#[tokio::test]
async fn failure_on_a_later_item_rolls_back_earlier_decrements() {
    let db = store().await;
    let ana = client(&db, "Ana", "ana@example.com").await;
    let plenty = product(&db, "Plenty", 100, 50).await;
    let scarce = product(&db, "Scarce", 100, 1).await;

    let err = db
        .workflow()
        .create(&SaleRequest::new(&ana.id, [(&plenty.id, 10), (&scarce.id, 2)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::InsufficientStock { .. })
    ));

    assert_eq!(stock_of(&db, &plenty.id).await, 50);
    assert_eq!(stock_of(&db, &scarce.id).await, 1);
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_product_rolls_back_everything() {
    let db = store().await;
    let ana = client(&db, "Ana", "ana@example.com").await;
    let p = product(&db, "Real", 100, 5).await;

    let err = db
        .workflow()
        .create(&SaleRequest::new(&ana.id, [(p.id.as_str(), 2), ("ghost", 1)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::ProductNotFound(ref id)) if id == "ghost"
    ));
    assert_eq!(err.class(), ventas_core::ErrorClass::NotFound);

    assert_eq!(stock_of(&db, &p.id).await, 5);
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn repeated_product_sees_its_own_earlier_decrement() {
    let db = store().await;
    let ana = client(&db, "Ana", "ana@example.com").await;
    let p = product(&db, "Lamp", 700, 5).await;

    let err = db
        .workflow()
        .create(&SaleRequest::new(&ana.id, [(&p.id, 3), (&p.id, 3)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::InsufficientStock { available: 2, requested: 3, .. })
    ));
    assert_eq!(stock_of(&db, &p.id).await, 5);

    let detail = db
        .workflow()
        .create(&SaleRequest::new(&ana.id, [(&p.id, 3), (&p.id, 2)]))
        .await
        .unwrap();
    assert_eq!(detail.lines.len(), 2);
    assert_eq!(stock_of(&db, &p.id).await, 0);
}

#[tokio::test]
async fn invalid_quantities_are_rejected_before_any_change() {
    let db = store().await;
    let ana = client(&db, "Ana", "ana@example.com").await;
    let p = product(&db, "Lamp", 700, 5).await;

    for qty in [0, -2] {
        let err = db
            .workflow()
            .create(&SaleRequest::new(&ana.id, [(&p.id, qty)]))
            .await
            .unwrap_err();
        assert_eq!(err.class(), ventas_core::ErrorClass::InvalidInput);
    }
    assert_eq!(stock_of(&db, &p.id).await, 5);
}

#[tokio::test]
async fn list_all_is_most_recent_first() {
    let db = store().await;
    let ana = client(&db, "Ana", "ana@example.com").await;
    let p = product(&db, "Lamp", 700, 50).await;

    let old = sale_at(&db, at(2024, 1, 1, 9), &ana.id, &[(&p.id, 1)]).await;
    let new = sale_at(&db, at(2024, 3, 1, 9), &ana.id, &[(&p.id, 2)]).await;
    let mid = sale_at(&db, at(2024, 2, 1, 9), &ana.id, &[(&p.id, 3)]).await;

    let ids: Vec<_> = db
        .workflow()
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.sale.id)
        .collect();
    assert_eq!(ids, [new.sale.id, mid.sale.id, old.sale.id]);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn create_then_cancel_restores_stock_exactly_once() {
    let db = store().await;
    let ana = client(&db, "Ana", "ana@example.com").await;
    let a = product(&db, "A", 100, 5).await;
    let b = product(&db, "B", 200, 8).await;

    let sale = db
        .workflow()
        .create(&SaleRequest::new(&ana.id, [(&a.id, 3), (&b.id, 4)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&db, &a.id).await, 2);
    assert_eq!(stock_of(&db, &b.id).await, 4);

    let cancelled = db.workflow().cancel(&sale.sale.id).await.unwrap();
    assert_eq!(cancelled.sale.status, SaleStatus::Cancelled);
    assert_eq!(cancelled.sale.total_cents, sale.sale.total_cents);
    assert_eq!(stock_of(&db, &a.id).await, 5);
    assert_eq!(stock_of(&db, &b.id).await, 8);

    let err = db.workflow().cancel(&sale.sale.id).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::AlreadyCancelled(_))
    ));
    assert_eq!(err.class(), ventas_core::ErrorClass::Conflict);
    assert_eq!(stock_of(&db, &a.id).await, 5);
    assert_eq!(stock_of(&db, &b.id).await, 8);
}

#[tokio::test]
async fn cancel_skips_products_deleted_since_the_sale() {
    let db = store().await;
    let ana = client(&db, "Ana", "ana@example.com").await;
    let kept = product(&db, "Kept", 100, 5).await;
    let gone = product(&db, "Gone", 100, 5).await;

    let sale = db
        .workflow()
        .create(&SaleRequest::new(&ana.id, [(&kept.id, 2), (&gone.id, 2)]))
        .await
        .unwrap();
    db.products().delete(&gone.id).await.unwrap();

    let detail = db.workflow().get_by_id(&sale.sale.id).await.unwrap();
    assert!(detail.lines[1].product.is_none());
    assert_eq!(detail.lines[1].line.unit_price_cents, 100);

    let cancelled = db.workflow().cancel(&sale.sale.id).await.unwrap();
    assert_eq!(cancelled.sale.status, SaleStatus::Cancelled);
    assert_eq!(stock_of(&db, &kept.id).await, 5);
    assert!(db.products().get_by_id(&gone.id).await.unwrap().is_none());
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_never_oversell() {
    let path = std::env::temp_dir().join(format!("ventas-race-{}.db", uuid::Uuid::new_v4()));
    let db = Database::new(DbConfig::new(&path).max_connections(5))
        .await
        .unwrap();

    let ana = client(&db, "Ana", "ana@example.com").await;
    let p = product(&db, "Hot item", 1_000, 10).await;
    let initial = 10;

    let mut handles = Vec::new();
    for n in 0..24 {
        let workflow = db.workflow();
        let request = SaleRequest::new(&ana.id, [(&p.id, 1 + (n % 2))]);
        handles.push(tokio::spawn(async move {
            let qty = request.items[0].quantity;
            (qty, workflow.create(&request).await)
        }));
    }

    let mut sold = 0;
    let mut successes = 0;
    for handle in handles {
        let (qty, result) = handle.await.unwrap();
        match result {
            Ok(_) => {
                sold += qty;
                successes += 1;
            }
            Err(ServiceError::Domain(CoreError::InsufficientStock { .. })) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let remaining = stock_of(&db, &p.id).await;
    assert!(remaining >= 0);
    assert_eq!(remaining, initial - sold);
    // Writers queue instead of failing, so the stock runs out completely
    // or leaves a single unit that no two-unit request could take.
    assert!(remaining <= 1);
    assert_eq!(db.sales().count().await.unwrap(), successes);

    db.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_with_enough_stock_all_succeed() {
    let path = std::env::temp_dir().join(format!("ventas-queue-{}.db", uuid::Uuid::new_v4()));
    let db = Database::new(DbConfig::new(&path).max_connections(5))
        .await
        .unwrap();

    let ana = client(&db, "Ana", "ana@example.com").await;
    let p = product(&db, "Bulk item", 500, 1_000).await;

    let mut handles = Vec::new();
    for _ in 0..24 {
        let workflow = db.workflow();
        let request = SaleRequest::new(&ana.id, [(&p.id, 1)]);
        handles.push(tokio::spawn(async move { workflow.create(&request).await }));
    }

    for handle in handles {
        if let Err(e) = handle.await.unwrap() {
            panic!("sale failed under contention: {e}");
        }
    }

    assert_eq!(stock_of(&db, &p.id).await, 1_000 - 24);
    assert_eq!(db.sales().count().await.unwrap(), 24);

    db.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cancels_restore_once() {
    let path = std::env::temp_dir().join(format!("ventas-cancel-{}.db", uuid::Uuid::new_v4()));
    let db = Database::new(DbConfig::new(&path).max_connections(5))
        .await
        .unwrap();

    let ana = client(&db, "Ana", "ana@example.com").await;
    let p = product(&db, "Item", 1_000, 10).await;
    let sale = db
        .workflow()
        .create(&SaleRequest::new(&ana.id, [(&p.id, 4)]))
        .await
        .unwrap();

    let workflow = Arc::new(db.workflow());
    let mut handles = Vec::new();
    for _ in 0..6 {
        let workflow = Arc::clone(&workflow);
        let id = sale.sale.id.clone();
        handles.push(tokio::spawn(async move { workflow.cancel(&id).await }));
    }

    let mut cancelled = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => cancelled += 1,
            Err(ServiceError::Domain(CoreError::AlreadyCancelled(_))) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(cancelled, 1);
    assert_eq!(stock_of(&db, &p.id).await, 10);

    db.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}
