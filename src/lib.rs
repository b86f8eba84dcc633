// Clinic - Clinic Management REST Backend
// Copyright (c) 2025 Clinic Contributors
// Licensed under the MIT License

//! # Clinic - Clinic Management Backend
//!
//! A REST backend for a small clinic: identities with role-specific
//! profiles, appointment booking, and clinical notes.
//!
//! ## Overview
//!
//! This library provides:
//! - **Identities** for administrators, doctors and patients, with a doctor or
//!   patient profile keyed by the identity id
//! - **Authentication** with bcrypt password hashes and HS256 bearer tokens
//! - **Booking** that refuses past dates and rejects any appointment within
//!   the configured window of another one for the same doctor
//! - **Clinical notes** (prescriptions and medical records) stored as documents
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`api`] - axum router, extractors and response envelopes
//! - [`core`] - Services holding the business rules
//! - [`adapters`] - Store traits and their PostgreSQL and in-memory backends
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clinic::adapters::database::create_stores;
//! use clinic::config::load_config;
//! use clinic::core::services::ClinicServices;
//! use clinic::domain::{NewAppointment, UserId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("clinic.toml")?;
//!     let (store, notes) = create_stores(&config).await?;
//!     let services = ClinicServices::new(&config, store, notes);
//!
//!     let appointment = services
//!         .appointments
//!         .create(NewAppointment {
//!             patient_id: UserId::new(3)?,
//!             doctor_id: UserId::new(2)?,
//!             appointment_date: chrono::Utc::now() + chrono::Duration::hours(2),
//!             notes: None,
//!         })
//!         .await?;
//!
//!     println!("Booked appointment {}", appointment.id);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::ClinicError`]. The API layer maps
//! each variant to one HTTP status:
//!
//! ```rust
//! use clinic::api::response::status_of;
//! use clinic::domain::ClinicError;
//!
//! let clash = ClinicError::Conflict("Doctor already booked".to_string());
//! assert_eq!(status_of(&clash).as_u16(), 400);
//! ```

pub mod adapters;
pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
