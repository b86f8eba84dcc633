//! Route handlers, one module per resource

pub mod appointments;
pub mod auth;
pub mod doctors;
pub mod health;
pub mod patients;
pub mod prescriptions;
pub mod records;
pub mod users;
