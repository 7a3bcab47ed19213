//! # Unit of Work
//!
//! One store transaction with explicit commit and rollback.
//!
//! ```text
//! UnitOfWork::begin(pool) ──► conn() … conn() … ──┬─► commit()    all writes visible
//!                                                 └─► rollback()  none of them
//! ```
//!
//! Units start with `BEGIN IMMEDIATE`: the write lock is taken up front, so
//! concurrent units queue on the busy timeout instead of failing when a
//! deferred read lock cannot be upgraded.
//!
//! Dropping an uncommitted unit rolls it back too, so an early `?` return
//! never leaves half a sale behind. While a unit is open, every read and
//! write of the operation must go through [`UnitOfWork::conn`]: reads see
//! the unit's own writes, and the in-memory test pool has only one
//! connection to give out.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::warn;

use crate::error::{DbError, DbResult};

/// An open store transaction.
#[derive(Debug)]
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    /// Opens a write transaction on a pooled connection.
    pub async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(UnitOfWork { tx })
    }

    /// The transaction's connection, for repository functions.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    /// Makes every write of the unit durable.
    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    /// Discards every write of the unit.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    /// Rolls back after a failed step. A rollback failure is logged; the
    /// step's error is the one the caller sees.
    pub async fn abandon(self, reason: &str) {
        if let Err(e) = self.rollback().await {
            warn!(error = %e, reason = %reason, "Rollback failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use std::time::Duration;

    async fn count_clients(conn: &mut SqliteConnection) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(conn)
            .await
            .unwrap()
    }

    async fn insert_client(conn: &mut SqliteConnection, id: &str) {
        sqlx::query(
            "INSERT INTO clients (id, name, email, created_at, updated_at)
             VALUES (?1, 'X', ?1 || '@example.com', '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00')",
        )
        .bind(id)
        .execute(conn)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut uow = UnitOfWork::begin(db.pool()).await.unwrap();
        insert_client(uow.conn(), "a").await;
        assert_eq!(count_clients(uow.conn()).await, 1);
        uow.rollback().await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(count_clients(&mut conn).await, 0);
    }

    #[tokio::test]
    async fn test_commit_keeps_writes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut uow = UnitOfWork::begin(db.pool()).await.unwrap();
        insert_client(uow.conn(), "a").await;
        uow.commit().await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(count_clients(&mut conn).await, 1);
    }

    #[tokio::test]
    async fn test_begin_takes_the_write_lock() {
        let path = std::env::temp_dir().join(format!("ventas-uow-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(
            DbConfig::new(&path)
                .max_connections(2)
                .busy_timeout(Duration::from_millis(100)),
        )
        .await
        .unwrap();

        let first = UnitOfWork::begin(db.pool()).await.unwrap();
        // A second writer cannot start while the first one is open.
        let blocked = UnitOfWork::begin(db.pool()).await;
        assert!(matches!(blocked, Err(DbError::TransactionFailed(_))));

        first.commit().await.unwrap();
        let second = UnitOfWork::begin(db.pool()).await.unwrap();
        second.rollback().await.unwrap();

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn test_abandon_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let uow = UnitOfWork::begin(db.pool()).await.unwrap();
        let reason = String::from("failed step");
        let fut = uow.abandon(&reason);
        assert_send(&fut);
        fut.await;
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        {
            let mut uow = UnitOfWork::begin(db.pool()).await.unwrap();
            insert_client(uow.conn(), "a").await;
        }

        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(count_clients(&mut conn).await, 0);
    }
}
