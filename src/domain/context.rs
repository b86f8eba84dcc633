//! Error context extension trait
//!
//! Similar to `anyhow::Context`, but keeps `Result<T, ClinicError>`.
//! Client-facing errors (not found, conflict, invalid request, auth) pass
//! through untouched so the API layer still maps them to the right status;
//! infrastructure errors keep their variant and gain a message prefix.
//!
//! # Examples
//!
//! ```rust
//! use clinic::domain::Result;
//! use clinic::domain::context::ResultExt;
//!
//! fn read_file(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .context(format!("Failed to read file: {}", path))
//! }
//! ```

use crate::domain::errors::ClinicError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error (evaluated eagerly)
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation)
    ///
    /// ```rust
    /// use clinic::domain::Result;
    /// use clinic::domain::context::ResultExt;
    ///
    /// fn load_appointment(id: i64) -> Result<String> {
    ///     query(id).with_context(|| format!("Failed to load appointment {}", id))
    /// }
    /// # fn query(_id: i64) -> Result<String> { Ok(String::new()) }
    /// ```
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ClinicError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| wrap(e.into(), context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

fn wrap(err: ClinicError, context: impl std::fmt::Display) -> ClinicError {
    match err {
        ClinicError::Configuration(msg) => ClinicError::Configuration(format!("{context}: {msg}")),
        ClinicError::Database(msg) => ClinicError::Database(format!("{context}: {msg}")),
        ClinicError::Serialization(msg) => ClinicError::Serialization(format!("{context}: {msg}")),
        ClinicError::Io(msg) => ClinicError::Io(format!("{context}: {msg}")),
        ClinicError::Internal(msg) => ClinicError::Internal(format!("{context}: {msg}")),
        client => client,
    }
}
