mod embedded;

use embedded::migrations;

use deadpool_postgres::{
    Config, CreatePoolError, ManagerConfig, Pool, PoolConfig, PoolError, RecyclingMethod, Runtime,
};
use tokio_postgres::{NoTls, Row, Transaction, error::SqlState, types::ToSql};

use std::{future::Future, pin::Pin};

/// Future returned by the unit of work passed to [`Database::with_transaction`].
pub type TxFuture<'t, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 't>>;

/// Failure reported by the persistence gateway.
///
/// Carries the Postgres SQLSTATE when the server produced one, so the error
/// translator can classify constraint violations without parsing messages.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct StorageError {
    code: Option<SqlState>,
    message: String,
}

impl StorageError {
    pub fn new(code: Option<SqlState>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub const fn code(&self) -> Option<&SqlState> {
        self.code.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<tokio_postgres::Error> for StorageError {
    fn from(e: tokio_postgres::Error) -> Self {
        let message = e
            .as_db_error()
            .map_or_else(|| e.to_string(), |db| db.message().to_string());

        Self::new(e.code().cloned(), message)
    }
}

impl From<PoolError> for StorageError {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::Backend(e) => e.into(),
            other => Self::new(None, format!("connection pool error: {other}")),
        }
    }
}

impl From<CreatePoolError> for StorageError {
    fn from(e: CreatePoolError) -> Self {
        Self::new(None, format!("failed to create connection pool: {e}"))
    }
}

impl From<refinery::Error> for StorageError {
    fn from(e: refinery::Error) -> Self {
        Self::new(None, format!("migration failed: {e}"))
    }
}

/// Pooled access to Postgres.
///
/// Built once at startup and handed to the repository; cloning shares the
/// same pool. When every connection is checked out callers wait at the pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    pub fn connect(database_url: &str, max_size: usize) -> Result<Self, StorageError> {
        let mut cfg = Config::new();
        cfg.url = Some(database_url.to_string());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig::new(max_size));

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;

        tracing::info!("Database pool created, max size {}", max_size);

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StorageError> {
        let mut object = self.pool.get().await?;
        let client: &mut tokio_postgres::Client = &mut object;

        let migrations_report = migrations::runner().run_async(client).await?;

        for migration in migrations_report.applied_migrations() {
            tracing::info!(
                "Migration Applied -  Name: {}, Version: {}",
                migration.name(),
                migration.version()
            );
        }

        tracing::info!("DB migrations finished!");

        Ok(())
    }

    pub async fn query(
        &self,
        statement: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, StorageError> {
        let client = self.pool.get().await?;

        client.query(statement, params).await.map_err(|e| {
            tracing::error!("query failed: {e}; statement: {statement}");
            e.into()
        })
    }

    pub async fn query_opt(
        &self,
        statement: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, StorageError> {
        let client = self.pool.get().await?;

        client.query_opt(statement, params).await.map_err(|e| {
            tracing::error!("query failed: {e}; statement: {statement}");
            e.into()
        })
    }

    pub async fn query_one(
        &self,
        statement: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Row, StorageError> {
        let client = self.pool.get().await?;

        client.query_one(statement, params).await.map_err(|e| {
            tracing::error!("query failed: {e}; statement: {statement}");
            e.into()
        })
    }

    /// Runs a statement and returns the number of affected rows.
    pub async fn execute(
        &self,
        statement: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, StorageError> {
        let client = self.pool.get().await?;

        client.execute(statement, params).await.map_err(|e| {
            tracing::error!("statement failed: {e}; statement: {statement}");
            e.into()
        })
    }

    /// Runs `work` inside a transaction on a dedicated pooled connection.
    ///
    /// Commits when `work` succeeds and rolls back when it fails. The
    /// connection returns to the pool when this function returns, whatever
    /// the outcome.
    pub async fn with_transaction<T, F>(&self, work: F) -> Result<T, StorageError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t Transaction<'t>) -> TxFuture<'t, T> + Send,
    {
        let mut object = self.pool.get().await?;
        let client: &mut tokio_postgres::Client = &mut object;

        let tx = client.transaction().await?;

        let outcome = work(&tx).await;

        match outcome {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!("transaction rolled back: {e}");
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!("rollback failed: {rollback_err}");
                }
                Err(e)
            }
        }
    }

    pub async fn ping(&self) -> Result<(), StorageError> {
        let client = self.pool.get().await?;
        client.simple_query("SELECT 1").await?;

        Ok(())
    }

    pub fn close(&self) {
        self.pool.close();
        tracing::info!("Database pool closed");
    }
}
