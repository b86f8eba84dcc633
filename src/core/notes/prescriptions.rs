//! Prescriptions
//!
//! Patient, clinician and appointment ids inside a prescription are stored as
//! given; the relational store is never consulted.

use crate::adapters::database::{NoteStore, PrescriptionFilter};
use crate::core::notes::{check_range, DEFAULT_LATEST};
use crate::domain::{
    ClinicError, NewPrescription, NoteId, Prescription, PrescriptionUpdate, Result,
};
use chrono::Utc;
use std::sync::Arc;

pub struct PrescriptionService {
    notes: Arc<dyn NoteStore>,
}

impl PrescriptionService {
    pub fn new(notes: Arc<dyn NoteStore>) -> Self {
        Self { notes }
    }

    /// Stores a new, active prescription
    pub async fn create(&self, input: NewPrescription) -> Result<Prescription> {
        input.validate()?;
        let prescription = input.into_document();
        self.notes.insert_prescription(&prescription).await?;
        tracing::info!(
            prescription_id = %prescription.id,
            patient_id = prescription.patient_id,
            doctor_id = prescription.doctor_id,
            "Prescription created"
        );
        Ok(prescription)
    }

    pub async fn get(&self, id: &NoteId) -> Result<Prescription> {
        self.notes
            .get_prescription(id)
            .await?
            .ok_or_else(|| ClinicError::not_found("Prescription", id))
    }

    /// Prescriptions matching `filter`, newest first
    pub async fn list(&self, filter: &PrescriptionFilter) -> Result<Vec<Prescription>> {
        check_range(filter.from, filter.to)?;
        self.notes.list_prescriptions(filter).await
    }

    /// The patient's most recent prescriptions (10 unless `limit` is given)
    pub async fn latest_for_patient(
        &self,
        patient_id: i64,
        limit: Option<usize>,
    ) -> Result<Vec<Prescription>> {
        self.notes
            .list_prescriptions(&PrescriptionFilter {
                patient_id: Some(patient_id),
                limit: Some(limit.unwrap_or(DEFAULT_LATEST)),
                ..Default::default()
            })
            .await
    }

    pub async fn count(&self, filter: &PrescriptionFilter) -> Result<u64> {
        self.notes.count_prescriptions(filter).await
    }

    /// Replaces diagnosis, medications and instructions; the active flag is kept
    pub async fn update(&self, id: &NoteId, update: PrescriptionUpdate) -> Result<Prescription> {
        update.validate()?;
        let mut prescription = self.get(id).await?;
        update.apply(&mut prescription);
        self.replace(prescription).await
    }

    /// Sets `active = false`; there is no way back
    pub async fn deactivate(&self, id: &NoteId) -> Result<Prescription> {
        let mut prescription = self.get(id).await?;
        prescription.active = false;
        prescription.updated_at = Utc::now();
        let prescription = self.replace(prescription).await?;
        tracing::info!(prescription_id = %id, "Prescription deactivated");
        Ok(prescription)
    }

    pub async fn delete(&self, id: &NoteId) -> Result<()> {
        if !self.notes.delete_prescription(id).await? {
            return Err(ClinicError::not_found("Prescription", id));
        }
        tracing::info!(prescription_id = %id, "Prescription deleted");
        Ok(())
    }

    async fn replace(&self, prescription: Prescription) -> Result<Prescription> {
        if !self.notes.replace_prescription(&prescription).await? {
            return Err(ClinicError::not_found("Prescription", &prescription.id));
        }
        Ok(prescription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::Medication;
    use chrono::{Duration, Utc};

    fn input(patient_id: i64, diagnosis: &str) -> NewPrescription {
        NewPrescription {
            appointment_id: None,
            patient_id,
            doctor_id: 2,
            patient_name: None,
            doctor_name: Some("Dr. House".to_string()),
            diagnosis: diagnosis.to_string(),
            medications: vec![Medication {
                name: "Amoxicillin".to_string(),
                dosage: "500 mg".to_string(),
                frequency: Some("3x daily".to_string()),
                duration: Some("7 days".to_string()),
                instructions: None,
            }],
            instructions: None,
            prescription_date: None,
        }
    }

    fn service() -> PrescriptionService {
        PrescriptionService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_accepts_unknown_references() {
        let service = service();
        let created = service.create(input(4242, "Sinusitis")).await.unwrap();
        assert!(created.active);
        assert_eq!(service.get(&created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_requires_medications() {
        let mut bad = input(1, "Sinusitis");
        bad.medications.clear();
        let err = service().create(bad).await.unwrap_err();
        assert!(matches!(err, ClinicError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_deactivate_twice_stays_inactive() {
        let service = service();
        let created = service.create(input(1, "Sinusitis")).await.unwrap();

        assert!(!service.deactivate(&created.id).await.unwrap().active);
        assert!(!service.deactivate(&created.id).await.unwrap().active);

        let active_only = PrescriptionFilter {
            active: Some(true),
            ..Default::default()
        };
        assert!(service.list(&active_only).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_never_reactivates() {
        let service = service();
        let created = service.create(input(1, "Sinusitis")).await.unwrap();
        service.deactivate(&created.id).await.unwrap();

        let updated = service
            .update(
                &created.id,
                PrescriptionUpdate {
                    diagnosis: "Acute sinusitis".to_string(),
                    medications: created.medications.clone(),
                    instructions: Some("Take with food".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(!updated.active);
        assert_eq!(updated.diagnosis, "Acute sinusitis");
    }

    #[tokio::test]
    async fn test_latest_and_diagnosis_filter() {
        let service = service();
        let now = Utc::now();
        for days in 0..12 {
            let mut p = input(7, if days % 2 == 0 { "Asthma" } else { "Flu" });
            p.prescription_date = Some(now - Duration::days(days));
            service.create(p).await.unwrap();
        }

        let latest = service.latest_for_patient(7, None).await.unwrap();
        assert_eq!(latest.len(), 10);
        assert!(latest[0].prescription_date > latest[9].prescription_date);

        let asthma = PrescriptionFilter {
            doctor_id: Some(2),
            diagnosis: Some("ASTH".to_string()),
            ..Default::default()
        };
        assert_eq!(service.count(&asthma).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let now = Utc::now();
        let filter = PrescriptionFilter {
            patient_id: Some(1),
            from: Some(now),
            to: Some(now - Duration::days(1)),
            ..Default::default()
        };
        assert!(service().list(&filter).await.is_err());
    }
}
