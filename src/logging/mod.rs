//! Logging and observability
//!
//! Structured logging with:
//! - Console output
//! - Optional JSON file logging with rotation
//! - Configurable log levels
//!
//! Domain events (bookings, conflicts, failed logins, rejected tokens) go
//! through the macros below so their field names stay consistent.
//!
//! # Example
//!
//! ```no_run
//! use clinic::logging::init_logging;
//! use clinic::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log a successful booking
///
/// # Example
///
/// ```no_run
/// use clinic::log_appointment_booked;
///
/// log_appointment_booked!(7, 2, 1, "2030-01-01T10:00:00Z");
/// ```
#[macro_export]
macro_rules! log_appointment_booked {
    ($appointment_id:expr, $doctor_id:expr, $patient_id:expr, $date:expr) => {
        tracing::info!(
            appointment_id = %$appointment_id,
            doctor_id = %$doctor_id,
            patient_id = %$patient_id,
            appointment_date = %$date,
            "Appointment booked"
        );
    };
}

/// Log a booking rejected by the per-clinician conflict window
#[macro_export]
macro_rules! log_booking_conflict {
    ($doctor_id:expr, $date:expr, $clashes:expr) => {
        tracing::warn!(
            doctor_id = %$doctor_id,
            appointment_date = %$date,
            clashes = $clashes,
            "Booking rejected: clinician already booked within the conflict window"
        );
    };
}

/// Log a failed login attempt (never logs the password)
///
/// # Example
///
/// ```no_run
/// use clinic::log_login_failed;
///
/// log_login_failed!("alice", "bad credentials");
/// ```
#[macro_export]
macro_rules! log_login_failed {
    ($username:expr, $reason:expr) => {
        tracing::warn!(username = %$username, reason = $reason, "Login failed");
    };
}

/// Log a rejected bearer token
#[macro_export]
macro_rules! log_token_rejected {
    ($reason:expr) => {
        tracing::debug!(reason = %$reason, "Bearer token rejected");
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use clinic::log_error_with_context;
/// use clinic::domain::ClinicError;
///
/// let error = ClinicError::Database("connection refused".to_string());
/// log_error_with_context!(&error, "Failed to list appointments");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
