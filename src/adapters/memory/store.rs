//! RwLock-backed implementation of the store traits

use crate::adapters::database::traits::{
    within_window, AppointmentFilter, BookingOutcome, ClinicStore, DoctorFilter,
    MedicalRecordFilter, NoteStore, PatientFilter, PrescriptionFilter,
};
use crate::domain::notes::contains_ignore_case;
use crate::domain::{
    Appointment, AppointmentId, AppointmentStatus, ClinicError, ClinicianProfile, Doctor,
    Identity, IdentityDraft, MedicalRecord, NewAppointment, NoteId, Page, PageRequest, Patient,
    PatientProfile, Prescription, Result, Role, SortDirection, UserId, UserSortField,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Relational {
    last_user_id: i64,
    last_appointment_id: i64,
    users: BTreeMap<UserId, Identity>,
    doctors: BTreeMap<UserId, ClinicianProfile>,
    patients: BTreeMap<UserId, PatientProfile>,
    appointments: BTreeMap<AppointmentId, Appointment>,
}

impl Relational {
    fn next_user_id(&mut self) -> Result<UserId> {
        self.last_user_id += 1;
        UserId::new(self.last_user_id).map_err(ClinicError::Internal)
    }

    fn next_appointment_id(&mut self) -> Result<AppointmentId> {
        self.last_appointment_id += 1;
        AppointmentId::new(self.last_appointment_id).map_err(ClinicError::Internal)
    }

    fn ensure_unique(
        &self,
        username: Option<&str>,
        email: &str,
        except: Option<UserId>,
    ) -> Result<()> {
        for user in self.users.values().filter(|u| Some(u.id) != except) {
            if username.is_some_and(|name| user.username == name) {
                return Err(ClinicError::Conflict("Username already exists".to_string()));
            }
            if user.email == email {
                return Err(ClinicError::Conflict("Email already exists".to_string()));
            }
        }
        Ok(())
    }

    fn doctor(&self, id: UserId) -> Option<Doctor> {
        let identity = self.users.get(&id)?;
        let profile = self.doctors.get(&id)?;
        Some(Doctor {
            identity: identity.clone(),
            profile: profile.clone(),
        })
    }

    fn patient(&self, id: UserId) -> Option<Patient> {
        let identity = self.users.get(&id)?;
        let profile = self.patients.get(&id)?;
        Some(Patient {
            identity: identity.clone(),
            profile: profile.clone(),
        })
    }

    fn doctors_matching<'a>(
        &'a self,
        filter: &'a DoctorFilter,
    ) -> impl Iterator<Item = Doctor> + 'a {
        self.doctors
            .iter()
            .filter(move |(_, profile)| {
                filter
                    .specialization
                    .as_deref()
                    .map_or(true, |s| profile.specialization.eq_ignore_ascii_case(s))
                    && filter
                        .min_experience
                        .map_or(true, |min| profile.years_of_experience >= min)
            })
            .filter_map(move |(id, _)| self.doctor(*id))
    }

    fn appointments_matching<'a>(
        &'a self,
        filter: &'a AppointmentFilter,
    ) -> impl Iterator<Item = &'a Appointment> + 'a {
        self.appointments.values().filter(move |a| {
            filter.patient_id.map_or(true, |id| a.patient_id == id)
                && filter.doctor_id.map_or(true, |id| a.doctor_id == id)
                && filter.status.map_or(true, |s| a.status == s)
                && filter.from.map_or(true, |from| a.appointment_date >= from)
                && filter.to.map_or(true, |to| a.appointment_date <= to)
        })
    }

    fn clashes(
        &self,
        doctor_id: UserId,
        date: chrono::DateTime<Utc>,
        buffer: Duration,
        except: Option<AppointmentId>,
    ) -> Vec<Appointment> {
        self.appointments
            .values()
            .filter(|a| {
                a.doctor_id == doctor_id
                    && Some(a.id) != except
                    && within_window(a.appointment_date, date, buffer)
            })
            .cloned()
            .collect()
    }
}

#[derive(Default)]
struct Documents {
    prescriptions: HashMap<NoteId, Prescription>,
    medical_records: HashMap<NoteId, MedicalRecord>,
}

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    relational: RwLock<Relational>,
    documents: RwLock<Documents>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn prescription_matches(p: &Prescription, filter: &PrescriptionFilter) -> bool {
    filter.patient_id.map_or(true, |id| p.patient_id == id)
        && filter.doctor_id.map_or(true, |id| p.doctor_id == id)
        && filter
            .appointment_id
            .map_or(true, |id| p.appointment_id == Some(id))
        && filter.active.map_or(true, |active| p.active == active)
        && filter
            .diagnosis
            .as_deref()
            .map_or(true, |d| contains_ignore_case(&p.diagnosis, d))
        && filter.from.map_or(true, |from| p.prescription_date >= from)
        && filter.to.map_or(true, |to| p.prescription_date <= to)
}

fn record_matches(r: &MedicalRecord, filter: &MedicalRecordFilter) -> bool {
    filter.patient_id.map_or(true, |id| r.patient_id == id)
        && filter.doctor_id.map_or(true, |id| r.doctor_id == id)
        && filter
            .diagnosis
            .as_deref()
            .map_or(true, |d| contains_ignore_case(&r.diagnosis, d))
        && filter
            .follow_up_required
            .map_or(true, |f| r.follow_up_required == f)
        && filter.lab_test.as_deref().map_or(true, |t| {
            r.lab_results
                .iter()
                .any(|lab| contains_ignore_case(&lab.test_name, t))
        })
        && filter.from.map_or(true, |from| r.visit_date >= from)
        && filter.to.map_or(true, |to| r.visit_date <= to)
}

fn sort_identities(identities: &mut [Identity], field: UserSortField, direction: SortDirection) {
    identities.sort_by(|a, b| {
        let ordering = match field {
            UserSortField::FirstName => a.first_name.cmp(&b.first_name),
            UserSortField::LastName => a.last_name.cmp(&b.last_name),
            UserSortField::Username => a.username.cmp(&b.username),
            UserSortField::Email => a.email.cmp(&b.email),
            UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
        .then(a.id.cmp(&b.id));
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

#[async_trait]
impl ClinicStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_identity(&self, draft: IdentityDraft) -> Result<Identity> {
        let mut state = self.relational.write().await;
        state.ensure_unique(Some(&draft.username), &draft.email, None)?;

        let now = Utc::now();
        let identity = Identity {
            id: state.next_user_id()?,
            username: draft.username,
            email: draft.email,
            password_hash: draft.password_hash,
            first_name: draft.first_name,
            last_name: draft.last_name,
            phone: draft.phone,
            role: draft.role,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn get_identity(&self, id: UserId) -> Result<Option<Identity>> {
        Ok(self.relational.read().await.users.get(&id).cloned())
    }

    async fn find_identity_by_username(&self, username: &str) -> Result<Option<Identity>> {
        let state = self.relational.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let state = self.relational.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_identities(&self, page: &PageRequest) -> Result<Page<Identity>> {
        let state = self.relational.read().await;
        let mut all: Vec<Identity> = state.users.values().cloned().collect();
        sort_identities(&mut all, page.sort_by, page.direction);

        let total = all.len() as u64;
        let content = all
            .into_iter()
            .skip(page.offset())
            .take(page.size)
            .collect();
        Ok(Page::new(content, page, total))
    }

    async fn search_identities(&self, fragment: &str) -> Result<Vec<Identity>> {
        let state = self.relational.read().await;
        Ok(state
            .users
            .values()
            .filter(|u| {
                contains_ignore_case(&u.first_name, fragment)
                    || contains_ignore_case(&u.last_name, fragment)
            })
            .cloned()
            .collect())
    }

    async fn list_identities_by_role(&self, role: Role) -> Result<Vec<Identity>> {
        let state = self.relational.read().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect())
    }

    async fn update_identity(&self, identity: &Identity) -> Result<Option<Identity>> {
        let mut state = self.relational.write().await;
        if !state.users.contains_key(&identity.id) {
            return Ok(None);
        }
        state.ensure_unique(None, &identity.email, Some(identity.id))?;

        let Some(stored) = state.users.get_mut(&identity.id) else {
            return Ok(None);
        };
        stored.email = identity.email.clone();
        stored.first_name = identity.first_name.clone();
        stored.last_name = identity.last_name.clone();
        stored.phone = identity.phone.clone();
        stored.updated_at = identity.updated_at;
        Ok(Some(stored.clone()))
    }

    async fn delete_identity(&self, id: UserId) -> Result<bool> {
        let mut state = self.relational.write().await;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.doctors.remove(&id);
        state.patients.remove(&id);
        state
            .appointments
            .retain(|_, a| a.patient_id != id && a.doctor_id != id);
        Ok(true)
    }

    async fn insert_clinician_profile(
        &self,
        id: UserId,
        profile: ClinicianProfile,
    ) -> Result<Doctor> {
        let mut state = self.relational.write().await;
        if !state.users.contains_key(&id) {
            return Err(ClinicError::not_found("User", id));
        }
        if state.doctors.contains_key(&id) {
            return Err(ClinicError::Conflict(format!(
                "Doctor profile already exists for user {id}"
            )));
        }
        if state
            .doctors
            .values()
            .any(|p| p.license_number == profile.license_number)
        {
            return Err(ClinicError::Conflict(
                "License number already exists".to_string(),
            ));
        }
        state.doctors.insert(id, profile);
        state
            .doctor(id)
            .ok_or_else(|| ClinicError::not_found("Doctor", id))
    }

    async fn get_doctor(&self, id: UserId) -> Result<Option<Doctor>> {
        Ok(self.relational.read().await.doctor(id))
    }

    async fn find_doctor_by_license(&self, license_number: &str) -> Result<Option<Doctor>> {
        let state = self.relational.read().await;
        let id = state
            .doctors
            .iter()
            .find(|(_, p)| p.license_number == license_number)
            .map(|(id, _)| *id);
        Ok(id.and_then(|id| state.doctor(id)))
    }

    async fn list_doctors(&self, filter: &DoctorFilter) -> Result<Vec<Doctor>> {
        let state = self.relational.read().await;
        Ok(state.doctors_matching(filter).collect())
    }

    async fn list_specializations(&self) -> Result<Vec<String>> {
        let state = self.relational.read().await;
        let mut specializations: Vec<String> = state
            .doctors
            .values()
            .map(|p| p.specialization.clone())
            .collect();
        specializations.sort();
        specializations.dedup();
        Ok(specializations)
    }

    async fn count_doctors(&self, filter: &DoctorFilter) -> Result<u64> {
        let state = self.relational.read().await;
        Ok(state.doctors_matching(filter).count() as u64)
    }

    async fn update_doctor(&self, doctor: &Doctor) -> Result<Option<Doctor>> {
        let mut state = self.relational.write().await;
        let id = doctor.id();
        if !state.doctors.contains_key(&id) {
            return Ok(None);
        }
        state.doctors.insert(id, doctor.profile.clone());
        if let Some(identity) = state.users.get_mut(&id) {
            identity.phone = doctor.identity.phone.clone();
            identity.updated_at = doctor.identity.updated_at;
        }
        Ok(state.doctor(id))
    }

    async fn insert_patient_profile(
        &self,
        id: UserId,
        profile: PatientProfile,
    ) -> Result<Patient> {
        let mut state = self.relational.write().await;
        if !state.users.contains_key(&id) {
            return Err(ClinicError::not_found("User", id));
        }
        if state.patients.contains_key(&id) {
            return Err(ClinicError::Conflict(format!(
                "Patient profile already exists for user {id}"
            )));
        }
        state.patients.insert(id, profile);
        state
            .patient(id)
            .ok_or_else(|| ClinicError::not_found("Patient", id))
    }

    async fn get_patient(&self, id: UserId) -> Result<Option<Patient>> {
        Ok(self.relational.read().await.patient(id))
    }

    async fn find_patient_by_email(&self, email: &str) -> Result<Option<Patient>> {
        let state = self.relational.read().await;
        let id = state.users.values().find(|u| u.email == email).map(|u| u.id);
        Ok(id.and_then(|id| state.patient(id)))
    }

    async fn list_patients(&self, filter: &PatientFilter) -> Result<Vec<Patient>> {
        let state = self.relational.read().await;
        Ok(state
            .patients
            .keys()
            .filter_map(|id| state.patient(*id))
            .filter(|p| {
                filter.name.as_deref().map_or(true, |n| {
                    contains_ignore_case(&p.identity.first_name, n)
                        || contains_ignore_case(&p.identity.last_name, n)
                }) && filter
                    .last_name
                    .as_deref()
                    .map_or(true, |n| contains_ignore_case(&p.identity.last_name, n))
                    && (!filter.has_emergency_contact
                        || p.profile
                            .emergency_contact
                            .as_deref()
                            .is_some_and(|c| !c.trim().is_empty()))
            })
            .collect())
    }

    async fn count_patients(&self) -> Result<u64> {
        Ok(self.relational.read().await.patients.len() as u64)
    }

    async fn update_patient(&self, patient: &Patient) -> Result<Option<Patient>> {
        let mut state = self.relational.write().await;
        let id = patient.id();
        if !state.patients.contains_key(&id) {
            return Ok(None);
        }
        state.patients.insert(id, patient.profile.clone());
        if let Some(identity) = state.users.get_mut(&id) {
            identity.phone = patient.identity.phone.clone();
            identity.updated_at = patient.identity.updated_at;
        }
        Ok(state.patient(id))
    }

    async fn book_appointment(
        &self,
        candidate: NewAppointment,
        buffer: Duration,
    ) -> Result<BookingOutcome> {
        // Write lock held across check and insert
        let mut state = self.relational.write().await;
        let clashes = state.clashes(candidate.doctor_id, candidate.appointment_date, buffer, None);
        if !clashes.is_empty() {
            return Ok(BookingOutcome::Clash(clashes));
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: state.next_appointment_id()?,
            patient_id: candidate.patient_id,
            doctor_id: candidate.doctor_id,
            appointment_date: candidate.appointment_date,
            status: AppointmentStatus::Scheduled,
            notes: candidate.notes,
            created_at: now,
            updated_at: now,
        };
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(BookingOutcome::Saved(appointment))
    }

    async fn get_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>> {
        Ok(self.relational.read().await.appointments.get(&id).cloned())
    }

    async fn list_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>> {
        let state = self.relational.read().await;
        let mut appointments: Vec<Appointment> =
            state.appointments_matching(filter).cloned().collect();
        appointments.sort_by_key(|a| (a.appointment_date, a.id));
        Ok(appointments)
    }

    async fn count_appointments(&self, filter: &AppointmentFilter) -> Result<u64> {
        let state = self.relational.read().await;
        Ok(state.appointments_matching(filter).count() as u64)
    }

    async fn update_appointment(
        &self,
        appointment: &Appointment,
        conflict_buffer: Option<Duration>,
    ) -> Result<Option<BookingOutcome>> {
        let mut state = self.relational.write().await;
        if !state.appointments.contains_key(&appointment.id) {
            return Ok(None);
        }
        if let Some(buffer) = conflict_buffer {
            let clashes = state.clashes(
                appointment.doctor_id,
                appointment.appointment_date,
                buffer,
                Some(appointment.id),
            );
            if !clashes.is_empty() {
                return Ok(Some(BookingOutcome::Clash(clashes)));
            }
        }
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(Some(BookingOutcome::Saved(appointment.clone())))
    }

    async fn delete_appointment(&self, id: AppointmentId) -> Result<bool> {
        Ok(self.relational.write().await.appointments.remove(&id).is_some())
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_prescription(&self, prescription: &Prescription) -> Result<()> {
        let mut docs = self.documents.write().await;
        if docs.prescriptions.contains_key(&prescription.id) {
            return Err(ClinicError::Conflict(format!(
                "Prescription {} already exists",
                prescription.id
            )));
        }
        docs.prescriptions
            .insert(prescription.id.clone(), prescription.clone());
        Ok(())
    }

    async fn get_prescription(&self, id: &NoteId) -> Result<Option<Prescription>> {
        Ok(self.documents.read().await.prescriptions.get(id).cloned())
    }

    async fn list_prescriptions(&self, filter: &PrescriptionFilter) -> Result<Vec<Prescription>> {
        let docs = self.documents.read().await;
        let mut found: Vec<Prescription> = docs
            .prescriptions
            .values()
            .filter(|p| prescription_matches(p, filter))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.prescription_date.cmp(&a.prescription_date));
        if let Some(limit) = filter.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    async fn count_prescriptions(&self, filter: &PrescriptionFilter) -> Result<u64> {
        let docs = self.documents.read().await;
        Ok(docs
            .prescriptions
            .values()
            .filter(|p| prescription_matches(p, filter))
            .count() as u64)
    }

    async fn replace_prescription(&self, prescription: &Prescription) -> Result<bool> {
        let mut docs = self.documents.write().await;
        match docs.prescriptions.get_mut(&prescription.id) {
            Some(stored) => {
                *stored = prescription.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_prescription(&self, id: &NoteId) -> Result<bool> {
        Ok(self.documents.write().await.prescriptions.remove(id).is_some())
    }

    async fn insert_medical_record(&self, record: &MedicalRecord) -> Result<()> {
        let mut docs = self.documents.write().await;
        if docs.medical_records.contains_key(&record.id) {
            return Err(ClinicError::Conflict(format!(
                "Medical record {} already exists",
                record.id
            )));
        }
        docs.medical_records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get_medical_record(&self, id: &NoteId) -> Result<Option<MedicalRecord>> {
        Ok(self.documents.read().await.medical_records.get(id).cloned())
    }

    async fn list_medical_records(
        &self,
        filter: &MedicalRecordFilter,
    ) -> Result<Vec<MedicalRecord>> {
        let docs = self.documents.read().await;
        let mut found: Vec<MedicalRecord> = docs
            .medical_records
            .values()
            .filter(|r| record_matches(r, filter))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.visit_date.cmp(&a.visit_date));
        if let Some(limit) = filter.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    async fn count_medical_records(&self, filter: &MedicalRecordFilter) -> Result<u64> {
        let docs = self.documents.read().await;
        Ok(docs
            .medical_records
            .values()
            .filter(|r| record_matches(r, filter))
            .count() as u64)
    }

    async fn replace_medical_record(&self, record: &MedicalRecord) -> Result<bool> {
        let mut docs = self.documents.write().await;
        match docs.medical_records.get_mut(&record.id) {
            Some(stored) => {
                *stored = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_medical_record(&self, id: &NoteId) -> Result<bool> {
        Ok(self
            .documents
            .write()
            .await
            .medical_records
            .remove(id)
            .is_some())
    }
}
