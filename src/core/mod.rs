//! Core business logic for the clinic backend.
//!
//! Services sit between the HTTP layer and the stores. They validate input,
//! enforce the cross-entity rules and log domain events.
//!
//! # Modules
//!
//! - [`auth`] - Registration, login and bearer tokens
//! - [`directory`] - Identities and their doctor/patient specializations
//! - [`scheduling`] - Appointment booking with the per-doctor conflict window
//! - [`notes`] - Prescriptions and medical records
//! - [`services`] - The bundle of all services handed to the API
//!
//! # Example
//!
//! ```rust,no_run
//! use clinic::adapters::database::create_stores;
//! use clinic::config::load_config;
//! use clinic::core::services::ClinicServices;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("clinic.toml")?;
//! let (store, notes) = create_stores(&config).await?;
//! let services = ClinicServices::new(&config, store, notes);
//!
//! let login = services.auth.login("alice", "secret1").await?;
//! println!("token expires at {}", login.expires_at);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod directory;
pub mod notes;
pub mod scheduling;
pub mod services;
