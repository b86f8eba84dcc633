//! Appointment booking and lifecycle
//!
//! The conflict rule: a clinician may not hold two appointments whose times
//! are within `booking.conflict_buffer_minutes` of each other (closed
//! interval). The check and the write happen in one atomic store call.

use crate::adapters::database::{AppointmentFilter, BookingOutcome, ClinicStore};
use crate::config::schema::BookingConfig;
use crate::domain::{
    Appointment, AppointmentId, AppointmentStatus, AppointmentUpdate, ClinicError,
    DoctorAppointmentStats, NewAppointment, Result, UserId,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

pub struct AppointmentService {
    store: Arc<dyn ClinicStore>,
    buffer: Duration,
    enforce_transitions: bool,
}

impl AppointmentService {
    pub fn new(store: Arc<dyn ClinicStore>, config: &BookingConfig) -> Self {
        Self {
            store,
            buffer: Duration::minutes(config.conflict_buffer_minutes),
            enforce_transitions: config.enforce_status_transitions,
        }
    }

    /// Books an appointment with status `scheduled`
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` when the date is before now
    /// - `NotFound` when the patient or clinician profile does not exist
    /// - `Conflict` when the clinician is booked within the conflict window
    pub async fn create(&self, candidate: NewAppointment) -> Result<Appointment> {
        reject_past(candidate.appointment_date, Utc::now())?;

        if self.store.get_patient(candidate.patient_id).await?.is_none() {
            return Err(ClinicError::not_found("Patient", candidate.patient_id));
        }
        if self.store.get_doctor(candidate.doctor_id).await?.is_none() {
            return Err(ClinicError::not_found("Doctor", candidate.doctor_id));
        }

        let doctor_id = candidate.doctor_id;
        let date = candidate.appointment_date;
        match self.store.book_appointment(candidate, self.buffer).await? {
            BookingOutcome::Saved(appointment) => {
                crate::log_appointment_booked!(
                    appointment.id,
                    appointment.doctor_id,
                    appointment.patient_id,
                    appointment.appointment_date
                );
                Ok(appointment)
            }
            BookingOutcome::Clash(clashes) => Err(self.conflict(doctor_id, date, clashes.len())),
        }
    }

    pub async fn get(&self, id: AppointmentId) -> Result<Appointment> {
        self.store
            .get_appointment(id)
            .await?
            .ok_or_else(|| ClinicError::not_found("Appointment", id))
    }

    /// Appointments matching `filter`, earliest first
    pub async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(ClinicError::invalid("Start date must not be after end date"));
            }
        }
        self.store.list_appointments(filter).await
    }

    /// Replaces date, notes and status
    ///
    /// A changed date must not be in the past. The conflict window is checked
    /// again against the clinician's other appointments.
    pub async fn update(&self, id: AppointmentId, update: AppointmentUpdate) -> Result<Appointment> {
        let mut appointment = self.get(id).await?;

        if update.appointment_date != appointment.appointment_date {
            reject_past(update.appointment_date, Utc::now())?;
        }
        self.check_transition(appointment.status, update.status)?;

        appointment.appointment_date = update.appointment_date;
        appointment.notes = update.notes;
        appointment.status = update.status;
        appointment.updated_at = Utc::now();

        match self
            .store
            .update_appointment(&appointment, Some(self.buffer))
            .await?
        {
            Some(BookingOutcome::Saved(saved)) => {
                tracing::info!(appointment_id = %id, status = %saved.status, "Appointment updated");
                Ok(saved)
            }
            Some(BookingOutcome::Clash(clashes)) => Err(self.conflict(
                appointment.doctor_id,
                appointment.appointment_date,
                clashes.len(),
            )),
            None => Err(ClinicError::not_found("Appointment", id)),
        }
    }

    /// Writes a new status, subject to the transition table when enforced
    pub async fn update_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        let mut appointment = self.get(id).await?;
        self.check_transition(appointment.status, status)?;

        let previous = appointment.status;
        appointment.status = status;
        appointment.updated_at = Utc::now();

        match self.store.update_appointment(&appointment, None).await? {
            Some(BookingOutcome::Saved(saved)) => {
                tracing::info!(
                    appointment_id = %id,
                    from = %previous,
                    to = %status,
                    "Appointment status changed"
                );
                Ok(saved)
            }
            Some(BookingOutcome::Clash(_)) => Err(ClinicError::Internal(
                "Status update reported a booking clash".to_string(),
            )),
            None => Err(ClinicError::not_found("Appointment", id)),
        }
    }

    /// Removes the appointment; notes that reference it are left untouched
    pub async fn delete(&self, id: AppointmentId) -> Result<()> {
        if !self.store.delete_appointment(id).await? {
            return Err(ClinicError::not_found("Appointment", id));
        }
        tracing::info!(appointment_id = %id, "Appointment deleted");
        Ok(())
    }

    /// Number of appointments still in `scheduled` for the clinician
    pub async fn count_scheduled(&self, doctor_id: UserId) -> Result<u64> {
        self.store
            .count_appointments(&AppointmentFilter {
                doctor_id: Some(doctor_id),
                status: Some(AppointmentStatus::Scheduled),
                ..Default::default()
            })
            .await
    }

    /// Appointment counts per status for one clinician
    pub async fn doctor_stats(&self, doctor_id: UserId) -> Result<DoctorAppointmentStats> {
        if self.store.get_doctor(doctor_id).await?.is_none() {
            return Err(ClinicError::not_found("Doctor", doctor_id));
        }
        let appointments = self
            .store
            .list_appointments(&AppointmentFilter {
                doctor_id: Some(doctor_id),
                ..Default::default()
            })
            .await?;
        Ok(DoctorAppointmentStats::tally(doctor_id, &appointments))
    }

    fn check_transition(&self, from: AppointmentStatus, to: AppointmentStatus) -> Result<()> {
        if self.enforce_transitions && !from.can_transition_to(to) {
            return Err(ClinicError::invalid(format!(
                "Cannot change appointment status from {from} to {to}"
            )));
        }
        Ok(())
    }

    fn conflict(&self, doctor_id: UserId, date: DateTime<Utc>, clashes: usize) -> ClinicError {
        crate::log_booking_conflict!(doctor_id, date, clashes);
        ClinicError::Conflict(format!(
            "Doctor already has an appointment within {} minutes of {}",
            self.buffer.num_minutes(),
            date.to_rfc3339()
        ))
    }
}

fn reject_past(date: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if date < now {
        return Err(ClinicError::invalid("Appointment date cannot be in the past"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::{ClinicianProfile, IdentityDraft, PatientProfile, Role};

    struct Fixture {
        service: AppointmentService,
        patient: UserId,
        doctor: UserId,
    }

    async fn draft(store: &MemoryStore, username: &str, role: Role) -> UserId {
        store
            .insert_identity(IdentityDraft {
                username: username.to_string(),
                email: format!("{username}@clinic.test"),
                password_hash: "hash".to_string(),
                first_name: username.to_string(),
                last_name: "Test".to_string(),
                phone: None,
                role,
            })
            .await
            .unwrap()
            .id
    }

    async fn fixture(enforce_transitions: bool) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let patient = draft(&store, "pat", Role::Patient).await;
        let doctor = draft(&store, "doc", Role::Doctor).await;
        store
            .insert_patient_profile(patient, PatientProfile::default())
            .await
            .unwrap();
        store
            .insert_clinician_profile(
                doctor,
                ClinicianProfile {
                    specialization: "General".to_string(),
                    license_number: "LIC-1".to_string(),
                    years_of_experience: 4,
                    qualification: None,
                    consultation_fee: None,
                },
            )
            .await
            .unwrap();
        let config = BookingConfig {
            conflict_buffer_minutes: 60,
            enforce_status_transitions: enforce_transitions,
        };
        Fixture {
            service: AppointmentService::new(store, &config),
            patient,
            doctor,
        }
    }

    fn request(f: &Fixture, at: DateTime<Utc>) -> NewAppointment {
        NewAppointment {
            patient_id: f.patient,
            doctor_id: f.doctor,
            appointment_date: at,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_created_appointment_reads_back() {
        let f = fixture(true).await;
        let at = Utc::now() + Duration::hours(4);
        let mut candidate = request(&f, at);
        candidate.notes = Some("first visit".to_string());

        let created = f.service.create(candidate).await.unwrap();
        let fetched = f.service.get(created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.patient_id, f.patient);
        assert_eq!(fetched.doctor_id, f.doctor);
        assert_eq!(fetched.appointment_date, at);
        assert_eq!(fetched.notes.as_deref(), Some("first visit"));
        assert_eq!(fetched.status, AppointmentStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_update_carries_status_through_transitions() {
        let f = fixture(true).await;
        let at = Utc::now() + Duration::hours(5);
        let a = f.service.create(request(&f, at)).await.unwrap();
        let update = |status| AppointmentUpdate {
            appointment_date: at,
            notes: None,
            status,
        };

        let confirmed = f
            .service
            .update(a.id, update(AppointmentStatus::Confirmed))
            .await
            .unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
        assert_eq!(
            f.service.get(a.id).await.unwrap().status,
            AppointmentStatus::Confirmed
        );

        f.service
            .update(a.id, update(AppointmentStatus::Cancelled))
            .await
            .unwrap();
        let err = f
            .service
            .update(a.id, update(AppointmentStatus::Scheduled))
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_rejects_past_booking() {
        let f = fixture(true).await;
        let err = f
            .service
            .create(request(&f, Utc::now() - Duration::minutes(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_conflict_window_is_closed_hour() {
        let f = fixture(true).await;
        let t = Utc::now() + Duration::days(1);
        let booked = f.service.create(request(&f, t)).await.unwrap();
        assert_eq!(booked.status, AppointmentStatus::Scheduled);

        for offset in [-60, -30, 0, 30, 60] {
            let err = f
                .service
                .create(request(&f, t + Duration::minutes(offset)))
                .await
                .unwrap_err();
            assert!(matches!(err, ClinicError::Conflict(_)), "offset {offset}");
        }
        f.service
            .create(request(&f, t + Duration::minutes(61)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_participants_are_not_found() {
        let f = fixture(true).await;
        let mut candidate = request(&f, Utc::now() + Duration::hours(3));
        candidate.doctor_id = f.patient;
        let err = f.service.create(candidate).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Doctor not found: {}", f.patient));
    }

    #[tokio::test]
    async fn test_status_transitions_enforced() {
        let f = fixture(true).await;
        let a = f
            .service
            .create(request(&f, Utc::now() + Duration::hours(3)))
            .await
            .unwrap();
        f.service
            .update_status(a.id, AppointmentStatus::Completed)
            .await
            .unwrap();
        let err = f
            .service
            .update_status(a.id, AppointmentStatus::Scheduled)
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_status_overwrite_when_not_enforced() {
        let f = fixture(false).await;
        let a = f
            .service
            .create(request(&f, Utc::now() + Duration::hours(3)))
            .await
            .unwrap();
        f.service
            .update_status(a.id, AppointmentStatus::Cancelled)
            .await
            .unwrap();
        let back = f
            .service
            .update_status(a.id, AppointmentStatus::Scheduled)
            .await
            .unwrap();
        assert_eq!(back.status, AppointmentStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_update_excludes_itself_from_conflicts() {
        let f = fixture(true).await;
        let t = Utc::now() + Duration::days(2);
        let a = f.service.create(request(&f, t)).await.unwrap();
        let other = f
            .service
            .create(request(&f, t + Duration::hours(3)))
            .await
            .unwrap();

        // Moving by 30 minutes only overlaps with itself
        let moved = f
            .service
            .update(
                a.id,
                AppointmentUpdate {
                    appointment_date: t + Duration::minutes(30),
                    notes: Some("moved".to_string()),
                    status: AppointmentStatus::Confirmed,
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.notes.as_deref(), Some("moved"));

        let err = f
            .service
            .update(
                a.id,
                AppointmentUpdate {
                    appointment_date: other.appointment_date + Duration::minutes(15),
                    notes: None,
                    status: AppointmentStatus::Confirmed,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_counts_and_stats() {
        let f = fixture(true).await;
        let base = Utc::now() + Duration::days(1);
        let a = f.service.create(request(&f, base)).await.unwrap();
        f.service
            .create(request(&f, base + Duration::hours(2)))
            .await
            .unwrap();
        f.service
            .update_status(a.id, AppointmentStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(f.service.count_scheduled(f.doctor).await.unwrap(), 1);
        let stats = f.service.doctor_stats(f.doctor).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.confirmed, 1);
        assert_eq!(stats.scheduled, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let f = fixture(true).await;
        let a = f
            .service
            .create(request(&f, Utc::now() + Duration::hours(5)))
            .await
            .unwrap();
        f.service.delete(a.id).await.unwrap();
        assert!(matches!(
            f.service.get(a.id).await,
            Err(ClinicError::NotFound { .. })
        ));
        assert!(f.service.delete(a.id).await.is_err());
    }
}
