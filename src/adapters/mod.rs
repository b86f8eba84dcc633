//! Storage backends for the clinic backend.
//!
//! - [`database`] - Store traits, filters and the backend factory
//! - [`postgresql`] - PostgreSQL implementation (relational tables plus JSONB documents)
//! - [`memory`] - In-process implementation for development and tests
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern**: services depend only on the
//! [`database::ClinicStore`] and [`database::NoteStore`] traits, and the
//! factory picks the implementation from configuration.
//!
//! ```rust,no_run
//! use clinic::adapters::database::create_stores;
//! use clinic::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("clinic.toml")?;
//! let (store, notes) = create_stores(&config).await?;
//! store.test_connection().await?;
//! # let _ = notes;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod memory;
pub mod postgresql;
