//! PostgreSQL person store.
//!
//! Connection pooling via deadpool-postgres; transactions run as explicit
//! BEGIN/COMMIT/ROLLBACK on a connection checked out for the transaction's
//! lifetime. The partial unique index on `identity_no` (see `schema.sql`)
//! is the authoritative conflict resolver: SQLSTATE 23505 on insert maps to
//! [`StorageError::Conflict`].

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};
use std::time::Duration;
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};

use motorid_core::{Person, PersonId, StorageError, StorageResult, ViewUpdate};
use motorid_storage::{PersonStore, PersonTx};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "motorid".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("MOTORID_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("MOTORID_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("MOTORID_DB_NAME").unwrap_or_else(|_| "motorid".to_string()),
            user: std::env::var("MOTORID_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("MOTORID_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("MOTORID_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("MOTORID_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> StorageResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StorageError::ConnectionFailed {
                reason: format!("Failed to create pool: {e}"),
            })
    }
}

// ============================================================================
// STORE
// ============================================================================

const PERSON_COLUMNS: &str = "id, identity_no, name, phone, email, address, \
     identity_frontal_view, identity_rear_view, license_frontal_view, \
     verified, deleted, created_at, updated_at";

/// PostgreSQL-backed person store.
#[derive(Clone)]
pub struct PgPersonStore {
    pool: Pool,
}

impl PgPersonStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> StorageResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Current pool size, for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    async fn get_conn(&self) -> StorageResult<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| StorageError::ConnectionFailed {
                reason: e.to_string(),
            })
    }
}

fn query_error(e: tokio_postgres::Error) -> StorageError {
    StorageError::TransactionFailed {
        reason: e.to_string(),
    }
}

fn row_to_person(row: &Row) -> Person {
    Person {
        id: row.get("id"),
        identity_no: row.get("identity_no"),
        name: row.get("name"),
        phone: row.get("phone"),
        email: row.get("email"),
        address: row.get("address"),
        identity_frontal_view: row.get("identity_frontal_view"),
        identity_rear_view: row.get("identity_rear_view"),
        license_frontal_view: row.get("license_frontal_view"),
        verified: row.get("verified"),
        deleted: row.get("deleted"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl PersonStore for PgPersonStore {
    async fn begin(&self) -> StorageResult<Box<dyn PersonTx + '_>> {
        let conn = self.get_conn().await?;
        conn.batch_execute("BEGIN").await.map_err(query_error)?;
        Ok(Box::new(PgTx { conn }))
    }

    async fn get_active(&self, id: PersonId) -> StorageResult<Option<Person>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = $1 AND NOT deleted");
        let row = conn
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(query_error)?;
        Ok(row.as_ref().map(row_to_person))
    }

    async fn get_active_by_identity_no(
        &self,
        identity_no: &str,
    ) -> StorageResult<Option<Person>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {PERSON_COLUMNS} FROM persons WHERE identity_no = $1 AND NOT deleted"
        );
        let row = conn
            .query_opt(sql.as_str(), &[&identity_no])
            .await
            .map_err(query_error)?;
        Ok(row.as_ref().map(row_to_person))
    }

    async fn get_active_many(&self, ids: &[PersonId]) -> StorageResult<Vec<Person>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {PERSON_COLUMNS} FROM persons WHERE id = ANY($1) AND NOT deleted ORDER BY id"
        );
        let rows = conn
            .query(sql.as_str(), &[&ids])
            .await
            .map_err(query_error)?;
        Ok(rows.iter().map(row_to_person).collect())
    }

    async fn list_active(&self) -> StorageResult<Vec<Person>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE NOT deleted ORDER BY id");
        let rows = conn
            .query(sql.as_str(), &[])
            .await
            .map_err(query_error)?;
        Ok(rows.iter().map(row_to_person).collect())
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// One BEGIN..COMMIT unit on a dedicated pooled connection. The worker
/// always resolves a transaction explicitly; there is no cancellation path
/// that abandons one mid-flight.
struct PgTx {
    conn: Object,
}

#[async_trait]
impl PersonTx for PgTx {
    async fn find_by_identity_no(&mut self, identity_no: &str) -> StorageResult<Option<Person>> {
        let sql = format!(
            "SELECT {PERSON_COLUMNS} FROM persons WHERE identity_no = $1 AND NOT deleted"
        );
        let row = self
            .conn
            .query_opt(sql.as_str(), &[&identity_no])
            .await
            .map_err(query_error)?;
        Ok(row.as_ref().map(row_to_person))
    }

    async fn insert(&mut self, person: &Person) -> StorageResult<()> {
        let result = self
            .conn
            .execute(
                "INSERT INTO persons (id, identity_no, name, phone, email, address, \
                 identity_frontal_view, identity_rear_view, license_frontal_view, \
                 verified, deleted, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
                &[
                    &person.id,
                    &person.identity_no,
                    &person.name,
                    &person.phone,
                    &person.email,
                    &person.address,
                    &person.identity_frontal_view,
                    &person.identity_rear_view,
                    &person.license_frontal_view,
                    &person.verified,
                    &person.deleted,
                    &person.created_at,
                    &person.updated_at,
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                Err(StorageError::Conflict {
                    identity_no: person.identity_no.clone(),
                })
            }
            Err(e) => Err(query_error(e)),
        }
    }

    async fn update_contact(
        &mut self,
        id: PersonId,
        name: &str,
        phone: Option<&str>,
    ) -> StorageResult<()> {
        let affected = self
            .conn
            .execute(
                "UPDATE persons SET name = $2, phone = $3, updated_at = now() WHERE id = $1",
                &[&id, &name, &phone],
            )
            .await
            .map_err(query_error)?;
        if affected == 0 {
            return Err(StorageError::NotFound { id });
        }
        Ok(())
    }

    async fn update_views(&mut self, update: &ViewUpdate) -> StorageResult<()> {
        // NULL or empty input keeps the stored value.
        let affected = self
            .conn
            .execute(
                "UPDATE persons SET \
                 identity_frontal_view = COALESCE(NULLIF($2, ''), identity_frontal_view), \
                 identity_rear_view = COALESCE(NULLIF($3, ''), identity_rear_view), \
                 license_frontal_view = COALESCE(NULLIF($4, ''), license_frontal_view), \
                 updated_at = now() \
                 WHERE id = $1",
                &[
                    &update.pid,
                    &update.identity_frontal_view,
                    &update.identity_rear_view,
                    &update.license_frontal_view,
                ],
            )
            .await
            .map_err(query_error)?;
        if affected == 0 {
            return Err(StorageError::NotFound { id: update.pid });
        }
        Ok(())
    }

    async fn set_verified(&mut self, identity_no: &str, flag: bool) -> StorageResult<()> {
        let affected = self
            .conn
            .execute(
                "UPDATE persons SET verified = $2, updated_at = now() \
                 WHERE identity_no = $1 AND NOT deleted",
                &[&identity_no, &flag],
            )
            .await
            .map_err(query_error)?;
        if affected == 0 {
            return Err(StorageError::IdentityNotFound {
                identity_no: identity_no.to_string(),
            });
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        self.conn.batch_execute("COMMIT").await.map_err(query_error)
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        self.conn
            .batch_execute("ROLLBACK")
            .await
            .map_err(query_error)
    }
}
