//! Identity directory: users, clinicians and patients
//!
//! Clinicians and patients are role specializations of an identity; both
//! services refuse a profile whose role does not match the identity's tag.

pub mod doctors;
pub mod patients;
pub mod users;

pub use doctors::DoctorService;
pub use patients::PatientService;
pub use users::UserService;
