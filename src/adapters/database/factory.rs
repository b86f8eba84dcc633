//! Store factory
//!
//! Creates the store implementations selected by `storage_backend`.

use crate::adapters::database::traits::{ClinicStore, NoteStore};
use crate::adapters::memory::MemoryStore;
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::{ClinicConfig, StorageBackend};
use crate::domain::{ClinicError, Result};
use std::sync::Arc;

/// Relational and document stores sharing one backend
pub type Stores = (Arc<dyn ClinicStore>, Arc<dyn NoteStore>);

/// Create both stores from the same underlying backend
///
/// For PostgreSQL both trait objects share one connection pool. No
/// connection is opened here; call `test_connection` to verify.
///
/// # Errors
///
/// Returns an error if the backend configuration is missing or the pool
/// cannot be built
pub async fn create_stores(config: &ClinicConfig) -> Result<Stores> {
    match config.storage_backend {
        StorageBackend::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                ClinicError::Configuration(
                    "postgresql configuration is required when storage_backend = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL stores");
            let client = Arc::new(PostgreSQLClient::new(pg_config.clone()).await?);
            let adapter = Arc::new(PostgreSQLAdapter::new_with_arc(client));

            Ok((
                adapter.clone() as Arc<dyn ClinicStore>,
                adapter as Arc<dyn NoteStore>,
            ))
        }
        StorageBackend::Memory => {
            tracing::info!("Creating in-memory stores");
            let store = Arc::new(MemoryStore::new());

            Ok((
                store.clone() as Arc<dyn ClinicStore>,
                store as Arc<dyn NoteStore>,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    const MINIMAL: &str = "[auth]\njwt_secret = \"test-secret\"\n";

    #[tokio::test]
    async fn test_memory_backend_is_default() {
        let config = parse_config(MINIMAL).unwrap();
        let (store, notes) = create_stores(&config).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
        assert_eq!(notes.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_postgresql_requires_section() {
        let mut config = parse_config(MINIMAL).unwrap();
        config.storage_backend = StorageBackend::PostgreSQL;
        let result = create_stores(&config).await;
        assert!(matches!(result, Err(ClinicError::Configuration(_))));
    }
}
