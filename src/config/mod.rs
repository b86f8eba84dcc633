//! Configuration management for the clinic backend.
//!
//! TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Configuration files support:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `CLINIC_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use clinic::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("clinic.toml")?;
//!
//! println!("Listening on {}", config.server.bind_address());
//! println!("Conflict buffer: {} min", config.booking.conflict_buffer_minutes);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`ServerConfig`] - HTTP listener and CORS
//! - [`AuthConfig`] - Token signing key, token lifetime, bcrypt cost
//! - [`BookingConfig`] - Conflict window and status transition policy
//! - [`PostgreSQLConfig`] - PostgreSQL connection pool
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//! storage_backend = "postgresql"
//!
//! [auth]
//! jwt_secret = "${CLINIC_JWT_SECRET}"
//!
//! [postgresql]
//! connection_string = "${CLINIC_DATABASE_URL}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, AuthConfig, BookingConfig, ClinicConfig, Environment, LoggingConfig,
    PostgreSQLConfig, ServerConfig, StorageBackend,
};
pub use secret::{secret_string, SecretString, SecretValue};
