//! PostgreSQL storage backend
//!
//! Relational tables for identities, role profiles and appointments, plus
//! JSONB document tables for prescriptions and medical records. One
//! [`PostgreSQLAdapter`] implements both store traits on a shared pool.

pub mod adapter;
pub mod client;
pub mod documents;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
