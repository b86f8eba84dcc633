//! Store abstraction layer
//!
//! Trait-based abstraction over the storage backends, so services work the
//! same against PostgreSQL and the in-process store.

pub mod factory;
pub mod traits;

pub use factory::create_stores;
pub use traits::{
    AppointmentFilter, BookingOutcome, ClinicStore, DoctorFilter, MedicalRecordFilter, NoteStore,
    PatientFilter, PrescriptionFilter,
};
