//! # Client Repository
//!
//! Registration and lookup of clients. Email is unique; a duplicate is
//! reported as a validation problem, not a store failure.

use std::sync::Arc;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;
use ventas_core::validation::validate_new_client;
use ventas_core::{Client, Clock, CoreError, NewClient, ValidationError};

use crate::error::{DbError, DbResult, ServiceResult};

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        ClientRepository { pool, clock }
    }

    /// Registers a client.
    ///
    /// ## Errors
    /// - `ValidationError` for a blank name, a malformed email or an email
    ///   that is already registered
    pub async fn create(&self, input: &NewClient) -> ServiceResult<Client> {
        validate_new_client(input)?;

        let now = self.clock.now();
        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input.phone.clone(),
            address: input.address.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %client.id, email = %client.email, "Inserting client");

        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        match insert(&mut conn, &client).await {
            Ok(()) => Ok(client),
            Err(DbError::UniqueViolation { .. }) => Err(ValidationError::Duplicate {
                field: "email".to_string(),
                value: client.email,
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Gets a client by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Gets a client by ID, failing with `ClientNotFound`.
    pub async fn get(&self, id: &str) -> ServiceResult<Client> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ClientNotFound(id.to_string()).into())
    }

    /// Lists all clients by name.
    pub async fn list(&self) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, email, phone, address, created_at, updated_at
            FROM clients
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    /// Counts clients.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Client>> {
    let client = sqlx::query_as::<_, Client>(
        r#"
        SELECT id, name, email, phone, address, created_at, updated_at
        FROM clients
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(client)
}

async fn insert(conn: &mut SqliteConnection, client: &Client) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO clients
            (id, name, email, phone, address, name_key, email_key, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&client.id)
    .bind(&client.name)
    .bind(&client.email)
    .bind(&client.phone)
    .bind(&client.address)
    .bind(client.name.to_lowercase())
    .bind(client.email.to_lowercase())
    .bind(client.created_at)
    .bind(client.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}
