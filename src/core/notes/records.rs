//! Medical records

use crate::adapters::database::{MedicalRecordFilter, NoteStore};
use crate::core::notes::{check_range, DEFAULT_LATEST};
use crate::domain::{ClinicError, MedicalRecord, MedicalRecordInput, NoteId, Result};
use std::sync::Arc;

pub struct MedicalRecordService {
    notes: Arc<dyn NoteStore>,
}

impl MedicalRecordService {
    pub fn new(notes: Arc<dyn NoteStore>) -> Self {
        Self { notes }
    }

    pub async fn create(&self, input: MedicalRecordInput) -> Result<MedicalRecord> {
        input.validate()?;
        let record = input.into_document();
        self.notes.insert_medical_record(&record).await?;
        tracing::info!(
            record_id = %record.id,
            patient_id = record.patient_id,
            follow_up = record.follow_up_required,
            "Medical record created"
        );
        Ok(record)
    }

    pub async fn get(&self, id: &NoteId) -> Result<MedicalRecord> {
        self.notes
            .get_medical_record(id)
            .await?
            .ok_or_else(|| ClinicError::not_found("Medical record", id))
    }

    /// Records matching `filter`, most recent visit first
    pub async fn list(&self, filter: &MedicalRecordFilter) -> Result<Vec<MedicalRecord>> {
        check_range(filter.from, filter.to)?;
        self.notes.list_medical_records(filter).await
    }

    pub async fn latest_for_patient(
        &self,
        patient_id: i64,
        limit: Option<usize>,
    ) -> Result<Vec<MedicalRecord>> {
        self.notes
            .list_medical_records(&MedicalRecordFilter {
                patient_id: Some(patient_id),
                limit: Some(limit.unwrap_or(DEFAULT_LATEST)),
                ..Default::default()
            })
            .await
    }

    pub async fn count(&self, filter: &MedicalRecordFilter) -> Result<u64> {
        self.notes.count_medical_records(filter).await
    }

    /// Replaces the record content, keeping its id and creation time
    pub async fn update(&self, id: &NoteId, input: MedicalRecordInput) -> Result<MedicalRecord> {
        input.validate()?;
        let mut record = self.get(id).await?;
        input.apply(&mut record);
        if !self.notes.replace_medical_record(&record).await? {
            return Err(ClinicError::not_found("Medical record", id));
        }
        tracing::info!(record_id = %id, "Medical record updated");
        Ok(record)
    }

    pub async fn delete(&self, id: &NoteId) -> Result<()> {
        if !self.notes.delete_medical_record(id).await? {
            return Err(ClinicError::not_found("Medical record", id));
        }
        tracing::info!(record_id = %id, "Medical record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::{LabResult, VitalSigns};
    use chrono::{Duration, Utc};

    fn input(patient_id: i64, diagnosis: &str) -> MedicalRecordInput {
        MedicalRecordInput {
            patient_id,
            doctor_id: 2,
            doctor_name: None,
            visit_date: None,
            diagnosis: diagnosis.to_string(),
            symptoms: vec!["fatigue".to_string()],
            treatment: None,
            notes: None,
            vital_signs: Some(VitalSigns {
                heart_rate: Some(72.0),
                temperature: Some(36.8),
                ..Default::default()
            }),
            lab_results: vec![LabResult {
                test_name: "Fasting Glucose".to_string(),
                result: "5.4".to_string(),
                unit: Some("mmol/L".to_string()),
                normal_range: Some("3.9-5.5".to_string()),
                notes: None,
            }],
            follow_up_required: false,
            follow_up_date: None,
        }
    }

    fn service() -> MedicalRecordService {
        MedicalRecordService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_round_trip() {
        let service = service();
        let visit = Utc::now() - Duration::days(1);
        let follow_up = visit + Duration::days(30);
        let mut submitted = input(3, "Anemia");
        submitted.doctor_name = Some("Dr. House".to_string());
        submitted.visit_date = Some(visit);
        submitted.treatment = Some("Iron supplements".to_string());
        submitted.notes = Some("Recheck in a month".to_string());
        submitted.follow_up_required = true;
        submitted.follow_up_date = Some(follow_up);

        let created = service.create(submitted.clone()).await.unwrap();
        let fetched = service.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.patient_id, submitted.patient_id);
        assert_eq!(fetched.doctor_id, submitted.doctor_id);
        assert_eq!(fetched.doctor_name, submitted.doctor_name);
        assert_eq!(fetched.visit_date, visit);
        assert_eq!(fetched.diagnosis, submitted.diagnosis);
        assert_eq!(fetched.symptoms, submitted.symptoms);
        assert_eq!(fetched.treatment, submitted.treatment);
        assert_eq!(fetched.notes, submitted.notes);
        assert_eq!(fetched.vital_signs, submitted.vital_signs);
        assert_eq!(fetched.lab_results, submitted.lab_results);
        assert!(fetched.follow_up_required);
        assert_eq!(fetched.follow_up_date, Some(follow_up));
    }

    #[tokio::test]
    async fn test_follow_up_date_requires_flag() {
        let mut bad = input(3, "Anemia");
        bad.follow_up_date = Some(Utc::now() + Duration::days(14));
        let err = service().create(bad).await.unwrap_err();
        assert!(matches!(err, ClinicError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_vitals() {
        let mut bad = input(3, "Anemia");
        bad.vital_signs = Some(VitalSigns {
            heart_rate: Some(0.0),
            ..Default::default()
        });
        assert!(service().create(bad).await.is_err());
    }

    #[tokio::test]
    async fn test_filters() {
        let service = service();
        service.create(input(3, "Iron deficiency anemia")).await.unwrap();
        let mut follow_up = input(3, "Hypertension");
        follow_up.follow_up_required = true;
        follow_up.lab_results.clear();
        service.create(follow_up).await.unwrap();
        service.create(input(4, "Anemia")).await.unwrap();

        let by_lab = MedicalRecordFilter {
            lab_test: Some("glucose".to_string()),
            ..Default::default()
        };
        assert_eq!(service.count(&by_lab).await.unwrap(), 2);

        let patient_diagnosis = MedicalRecordFilter {
            patient_id: Some(3),
            diagnosis: Some("ANEMIA".to_string()),
            ..Default::default()
        };
        assert_eq!(service.list(&patient_diagnosis).await.unwrap().len(), 1);

        let follow_ups = MedicalRecordFilter {
            follow_up_required: Some(true),
            ..Default::default()
        };
        assert_eq!(service.count(&follow_ups).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_identity() {
        let service = service();
        let created = service.create(input(3, "Anemia")).await.unwrap();
        let updated = service
            .update(&created.id, input(3, "Resolved anemia"))
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.visit_date, created.visit_date);
        assert_eq!(updated.diagnosis, "Resolved anemia");

        service.delete(&created.id).await.unwrap();
        assert!(service.get(&created.id).await.is_err());
    }
}
