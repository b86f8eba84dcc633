//! Clinical notes: prescriptions and medical records
//!
//! Both live in the document store and hold plain numeric references to
//! patients, clinicians and appointments.

pub mod prescriptions;
pub mod records;

pub use prescriptions::PrescriptionService;
pub use records::MedicalRecordService;

use crate::domain::{ClinicError, Result};
use chrono::{DateTime, Utc};

/// Size of a "latest N" read when the caller gives none
pub const DEFAULT_LATEST: usize = 10;

/// Rejects a date range whose start is after its end
pub(crate) fn check_range(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<()> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(ClinicError::invalid(
            "Start date must not be after end date",
        )),
        _ => Ok(()),
    }
}
