//! PostgreSQL client implementation
//!
//! Pooled connections, schema migration and the error mapping shared by the
//! relational and document adapters.

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{ClinicError, Result};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

/// Schema applied by [`PostgreSQLClient::ensure_database_exists`]
const INITIAL_SCHEMA: &str = include_str!("../../../migrations/001_initial_schema.sql");

/// PostgreSQL client
///
/// Provides methods for connecting to PostgreSQL, applying the schema and
/// running statements on pooled connections.
pub struct PostgreSQLClient {
    /// Connection pool
    pool: Pool,

    /// Configuration
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid or the pool
    /// cannot be built. No connection is opened here.
    pub async fn new(config: PostgreSQLConfig) -> Result<Self> {
        let pool = build_pool(&config)?;
        Ok(Self { pool, config })
    }

    /// Test the connection to PostgreSQL
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| ClinicError::Database(format!("Connection test failed: {}", e)))?;

        tracing::info!(
            database = %self.connection_string_safe(),
            "PostgreSQL connection test successful"
        );
        Ok(())
    }

    /// Ensure the database schema exists
    ///
    /// Runs the migration SQL to create tables and indexes if they don't exist.
    pub async fn ensure_database_exists(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .batch_execute(INITIAL_SCHEMA)
            .await
            .map_err(|e| ClinicError::Database(format!("Failed to execute migration: {}", e)))?;

        tracing::info!("PostgreSQL schema initialized successfully");
        Ok(())
    }

    /// Get a connection from the pool
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            ClinicError::Database(format!("Failed to get connection from pool: {}", e))
        })
    }

    /// `SET` statement applying the configured statement timeout
    ///
    /// `local` scopes it to the current transaction.
    pub fn statement_timeout_sql(&self, local: bool) -> String {
        format!(
            "SET {}statement_timeout = {}",
            if local { "LOCAL " } else { "" },
            self.config.statement_timeout_seconds * 1000
        )
    }

    /// Execute a query and return rows
    pub async fn query(&self, query: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let client = self.get_connection().await?;

        client
            .execute(&self.statement_timeout_sql(false), &[])
            .await
            .map_err(|e| {
                ClinicError::Database(format!("Failed to set statement timeout: {}", e))
            })?;

        Ok(client.query(query, params).await?)
    }

    /// Execute a statement and return the number of affected rows
    pub async fn execute(&self, statement: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64> {
        let client = self.get_connection().await?;

        client
            .execute(&self.statement_timeout_sql(false), &[])
            .await
            .map_err(|e| {
                ClinicError::Database(format!("Failed to set statement timeout: {}", e))
            })?;

        Ok(client.execute(statement, params).await?)
    }

    /// Get the connection string (without password)
    pub fn connection_string_safe(&self) -> String {
        redact_connection_string(self.config.connection_string.expose_secret().as_ref())
    }
}

fn build_pool(config: &PostgreSQLConfig) -> Result<Pool> {
    let conn_str: &str = config.connection_string.expose_secret().as_ref();
    let pg_config: tokio_postgres::Config = conn_str.parse().map_err(|e| {
        ClinicError::Configuration(format!("Invalid PostgreSQL connection string: {}", e))
    })?;

    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let manager = Manager::from_config(pg_config, NoTls, manager_config);
    let timeout = Some(Duration::from_secs(config.connection_timeout_seconds));

    Pool::builder(manager)
        .max_size(config.max_connections)
        .wait_timeout(timeout)
        .create_timeout(timeout)
        .recycle_timeout(timeout)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| ClinicError::Database(format!("Failed to create connection pool: {}", e)))
}

pub(crate) fn redact_connection_string(conn_str: &str) -> String {
    conn_str
        .rsplit_once('@')
        .map(|(_, host)| format!("postgresql://***@{}", host))
        .unwrap_or_else(|| "postgresql://***".to_string())
}

/// Friendly message for a named unique constraint
fn unique_violation_message(constraint: Option<&str>) -> String {
    match constraint {
        Some("uq_users_username") => "Username already exists".to_string(),
        Some("uq_users_email") => "Email already exists".to_string(),
        Some("uq_doctors_license_number") => "License number already exists".to_string(),
        Some("doctors_pkey") => "Doctor profile already exists for this user".to_string(),
        Some("patients_pkey") => "Patient profile already exists for this user".to_string(),
        Some(other) => format!("Duplicate value violates {other}"),
        None => "Duplicate value".to_string(),
    }
}

// Unique violations surface as conflicts; everything else is a store failure
impl From<tokio_postgres::Error> for ClinicError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            let constraint = err.as_db_error().and_then(|db| db.constraint());
            return ClinicError::Conflict(unique_violation_message(constraint));
        }
        ClinicError::Database(err.to_string())
    }
}
