//! Migrate command implementation
//!
//! Creates the schema for the configured store. For PostgreSQL this applies
//! `migrations/001_initial_schema.sql`, whose statements are idempotent; the
//! in-memory store has nothing to create.

use crate::adapters::database::create_stores;
use crate::config::load_config;
use clap::Args;

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {}

impl MigrateArgs {
    /// Execute the migrate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(1); // Configuration error exit code
            }
        };

        let (store, _) = match create_stores(&config).await {
            Ok(stores) => stores,
            Err(e) => {
                println!("❌ Invalid storage configuration");
                println!("   Error: {e}");
                return Ok(1);
            }
        };

        println!("🔧 Migrating the {} store", store.backend_name());
        if let Err(e) = store.test_connection().await {
            println!("❌ Failed to connect to the {} store", store.backend_name());
            println!("   Error: {e}");
            return Ok(5); // Fatal error exit code
        }
        if let Err(e) = store.ensure_schema().await {
            tracing::error!(error = %e, "Schema migration failed");
            println!("❌ Schema migration failed");
            println!("   Error: {e}");
            return Ok(5);
        }

        println!("✅ Schema is up to date");
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_memory_backend_migrates_cleanly() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[auth]\njwt_secret = \"migrate-secret\"\n")
            .unwrap();
        let path = file.path().to_str().unwrap();
        assert_eq!(MigrateArgs {}.execute(path).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_config_exits_with_config_error() {
        let code = MigrateArgs {}
            .execute("/nonexistent/clinic.toml")
            .await
            .unwrap();
        assert_eq!(code, 1);
    }
}
