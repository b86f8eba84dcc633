//! Validate config command implementation

use crate::adapters::postgresql::client::redact_connection_string;
use crate::config::load_config;
use crate::config::schema::StorageBackend;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(1); // Configuration error exit code
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Listen Address: {}", config.server.bind_address());
        println!("  CORS Origins: {:?}", config.server.cors_allowed_origins);
        println!("  Token TTL: {} minutes", config.auth.token_ttl_minutes);
        println!(
            "  Conflict Window: ±{} minutes",
            config.booking.conflict_buffer_minutes
        );
        println!(
            "  Status Transitions: {}",
            if config.booking.enforce_status_transitions {
                "enforced"
            } else {
                "permissive"
            }
        );

        match config.storage_backend {
            StorageBackend::Memory => println!("  Storage Backend: memory"),
            StorageBackend::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    use secrecy::ExposeSecret;
                    println!("  Storage Backend: PostgreSQL");
                    println!(
                        "  PostgreSQL Connection: {}",
                        redact_connection_string(pg_config.connection_string.expose_secret().as_ref())
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
            }
        }
        println!();
        Ok(0)
    }
}
