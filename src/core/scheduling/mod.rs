//! Appointment scheduling

pub mod service;

pub use service::AppointmentService;
