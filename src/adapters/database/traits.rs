//! Store abstraction traits
//!
//! [`ClinicStore`] covers the relational side (identities, role profiles,
//! appointments); [`NoteStore`] covers the clinical-note documents. A backend
//! may implement both on the same connection pool.

use crate::domain::{
    Appointment, AppointmentId, AppointmentStatus, ClinicianProfile, Doctor, Identity,
    IdentityDraft, MedicalRecord, NewAppointment, NoteId, Page, PageRequest, Patient,
    PatientProfile, Prescription, Result, Role, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

/// Outcome of an atomic check-and-write on the appointment book
#[derive(Debug, Clone)]
pub enum BookingOutcome {
    /// The appointment was written
    Saved(Appointment),
    /// Existing appointments for the clinician fall inside the conflict window
    Clash(Vec<Appointment>),
}

/// Filter for clinician listings; every field narrows the result
#[derive(Debug, Clone, Default)]
pub struct DoctorFilter {
    /// Exact specialization, case insensitive
    pub specialization: Option<String>,
    pub min_experience: Option<i32>,
}

/// Filter for patient listings
#[derive(Debug, Clone, Default)]
pub struct PatientFilter {
    /// Substring of first or last name, case insensitive
    pub name: Option<String>,
    /// Substring of last name, case insensitive
    pub last_name: Option<String>,
    pub has_emergency_contact: bool,
}

/// Filter for appointment listings; date bounds are inclusive
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub patient_id: Option<UserId>,
    pub doctor_id: Option<UserId>,
    pub status: Option<AppointmentStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Filter for prescription reads, newest first
#[derive(Debug, Clone, Default)]
pub struct PrescriptionFilter {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub appointment_id: Option<i64>,
    pub active: Option<bool>,
    /// Diagnosis substring, case insensitive
    pub diagnosis: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// Filter for medical record reads, newest visit first
#[derive(Debug, Clone, Default)]
pub struct MedicalRecordFilter {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    /// Diagnosis substring, case insensitive
    pub diagnosis: Option<String>,
    pub follow_up_required: Option<bool>,
    /// Lab test name substring, case insensitive
    pub lab_test: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// Relational store: identities, role profiles and the appointment book
///
/// Uniqueness violations (username, email, license number) are reported as
/// `ClinicError::Conflict`. Lookups return `Ok(None)` for absent rows; the
/// services decide whether that is a `NotFound`.
#[async_trait]
pub trait ClinicStore: Send + Sync {
    /// Backend name for logs and health output
    fn backend_name(&self) -> &'static str;

    /// Test the store connection
    async fn test_connection(&self) -> Result<()>;

    /// Create tables and indexes if they don't exist
    async fn ensure_schema(&self) -> Result<()>;

    // Identities

    async fn insert_identity(&self, draft: IdentityDraft) -> Result<Identity>;

    async fn get_identity(&self, id: UserId) -> Result<Option<Identity>>;

    async fn find_identity_by_username(&self, username: &str) -> Result<Option<Identity>>;

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>>;

    async fn list_identities(&self, page: &PageRequest) -> Result<Page<Identity>>;

    /// Identities whose first or last name contains `fragment`
    async fn search_identities(&self, fragment: &str) -> Result<Vec<Identity>>;

    async fn list_identities_by_role(&self, role: Role) -> Result<Vec<Identity>>;

    /// Writes the mutable identity fields; returns `Ok(None)` if absent
    async fn update_identity(&self, identity: &Identity) -> Result<Option<Identity>>;

    /// Removes the identity with its role profile and appointments
    async fn delete_identity(&self, id: UserId) -> Result<bool>;

    // Clinician profiles

    /// Attaches a clinician profile; the identity must exist without one
    async fn insert_clinician_profile(
        &self,
        id: UserId,
        profile: ClinicianProfile,
    ) -> Result<Doctor>;

    async fn get_doctor(&self, id: UserId) -> Result<Option<Doctor>>;

    async fn find_doctor_by_license(&self, license_number: &str) -> Result<Option<Doctor>>;

    async fn list_doctors(&self, filter: &DoctorFilter) -> Result<Vec<Doctor>>;

    async fn list_specializations(&self) -> Result<Vec<String>>;

    async fn count_doctors(&self, filter: &DoctorFilter) -> Result<u64>;

    async fn update_doctor(&self, doctor: &Doctor) -> Result<Option<Doctor>>;

    // Patient profiles

    async fn insert_patient_profile(&self, id: UserId, profile: PatientProfile)
        -> Result<Patient>;

    async fn get_patient(&self, id: UserId) -> Result<Option<Patient>>;

    async fn find_patient_by_email(&self, email: &str) -> Result<Option<Patient>>;

    async fn list_patients(&self, filter: &PatientFilter) -> Result<Vec<Patient>>;

    async fn count_patients(&self) -> Result<u64>;

    async fn update_patient(&self, patient: &Patient) -> Result<Option<Patient>>;

    // Appointments

    /// Books `candidate` unless the clinician already has an appointment
    /// within `buffer` of it; check and insert are atomic per clinician
    async fn book_appointment(
        &self,
        candidate: NewAppointment,
        buffer: Duration,
    ) -> Result<BookingOutcome>;

    async fn get_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>>;

    async fn list_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>>;

    async fn count_appointments(&self, filter: &AppointmentFilter) -> Result<u64>;

    /// Writes date, notes and status of an existing appointment
    ///
    /// With `conflict_buffer` set, the conflict window is re-checked against
    /// the clinician's other appointments in the same atomic step. Returns
    /// `Ok(None)` when the appointment no longer exists.
    async fn update_appointment(
        &self,
        appointment: &Appointment,
        conflict_buffer: Option<Duration>,
    ) -> Result<Option<BookingOutcome>>;

    async fn delete_appointment(&self, id: AppointmentId) -> Result<bool>;
}

/// Document store for prescriptions and medical records
///
/// References inside the documents are stored as given and never checked.
#[async_trait]
pub trait NoteStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn test_connection(&self) -> Result<()>;

    // Prescriptions

    async fn insert_prescription(&self, prescription: &Prescription) -> Result<()>;

    async fn get_prescription(&self, id: &NoteId) -> Result<Option<Prescription>>;

    async fn list_prescriptions(&self, filter: &PrescriptionFilter) -> Result<Vec<Prescription>>;

    async fn count_prescriptions(&self, filter: &PrescriptionFilter) -> Result<u64>;

    /// Overwrites a stored prescription; false if absent
    async fn replace_prescription(&self, prescription: &Prescription) -> Result<bool>;

    async fn delete_prescription(&self, id: &NoteId) -> Result<bool>;

    // Medical records

    async fn insert_medical_record(&self, record: &MedicalRecord) -> Result<()>;

    async fn get_medical_record(&self, id: &NoteId) -> Result<Option<MedicalRecord>>;

    async fn list_medical_records(&self, filter: &MedicalRecordFilter)
        -> Result<Vec<MedicalRecord>>;

    async fn count_medical_records(&self, filter: &MedicalRecordFilter) -> Result<u64>;

    async fn replace_medical_record(&self, record: &MedicalRecord) -> Result<bool>;

    async fn delete_medical_record(&self, id: &NoteId) -> Result<bool>;
}

/// True when `a` and `b` are within `buffer` of each other (closed interval)
pub fn within_window(a: DateTime<Utc>, b: DateTime<Utc>, buffer: Duration) -> bool {
    (a - b).abs() <= buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_closed() {
        let t = Utc::now();
        let hour = Duration::minutes(60);
        assert!(within_window(t, t, hour));
        assert!(within_window(t + hour, t, hour));
        assert!(within_window(t - hour, t, hour));
        assert!(!within_window(t + hour + Duration::minutes(1), t, hour));
    }
}
