//! Domain models and types for the clinic backend.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`UserId`], [`AppointmentId`], [`NoteId`])
//! - **Identity model** ([`Identity`] with an optional role specialization,
//!   exposed as [`Doctor`] and [`Patient`] views)
//! - **Scheduling** ([`Appointment`], [`AppointmentStatus`])
//! - **Clinical notes** ([`Prescription`], [`MedicalRecord`])
//! - **Error types** ([`ClinicError`], [`FieldError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ClinicError>`]:
//!
//! ```rust
//! use clinic::domain::{ClinicError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(ClinicError::not_found("Appointment", 7))
//! }
//! ```

pub mod appointment;
pub mod context;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod notes;
pub mod page;
pub mod result;

// Re-export commonly used types for convenience
pub use appointment::{
    Appointment, AppointmentStatus, AppointmentUpdate, DoctorAppointmentStats, NewAppointment,
};
pub use errors::{ClinicError, FieldError, Validator};
pub use identity::{
    ClinicianProfile, Doctor, DoctorUpdate, Identity, IdentityDraft, IdentityUpdate, NewIdentity,
    Patient, PatientProfile, PatientUpdate, Role, RoleProfile,
};
pub use ids::{AppointmentId, NoteId, UserId};
pub use notes::{
    LabResult, Medication, MedicalRecord, MedicalRecordInput, NewPrescription, Prescription,
    PrescriptionUpdate, VitalSigns,
};
pub use page::{Page, PageRequest, SortDirection, UserSortField};
pub use result::Result;
