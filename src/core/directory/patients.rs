//! Patient profiles

use crate::adapters::database::{ClinicStore, PatientFilter};
use crate::core::directory::doctors::require_role;
use crate::domain::{
    ClinicError, Patient, PatientProfile, PatientUpdate, Result, RoleProfile, UserId,
};
use chrono::Utc;
use std::sync::Arc;

pub struct PatientService {
    store: Arc<dyn ClinicStore>,
}

impl PatientService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    /// Attaches a patient profile to an existing identity with role patient
    pub async fn create(&self, id: UserId, profile: PatientProfile) -> Result<Patient> {
        profile.validate()?;
        let identity = self
            .store
            .get_identity(id)
            .await?
            .ok_or_else(|| ClinicError::not_found("User", id))?;
        require_role(identity.role, &RoleProfile::Patient(profile.clone()))?;

        let patient = self.store.insert_patient_profile(id, profile).await?;
        tracing::info!(patient_id = %id, "Patient profile created");
        Ok(patient)
    }

    pub async fn get(&self, id: UserId) -> Result<Patient> {
        self.store
            .get_patient(id)
            .await?
            .ok_or_else(|| ClinicError::not_found("Patient", id))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Patient> {
        self.store
            .find_patient_by_email(email.trim())
            .await?
            .ok_or_else(|| ClinicError::not_found("Patient", email))
    }

    pub async fn list(&self) -> Result<Vec<Patient>> {
        self.store.list_patients(&PatientFilter::default()).await
    }

    /// First or last name contains `fragment`, ignoring case
    pub async fn search(&self, fragment: &str) -> Result<Vec<Patient>> {
        let fragment = non_blank(fragment)?;
        self.store
            .list_patients(&PatientFilter {
                name: Some(fragment),
                ..Default::default()
            })
            .await
    }

    pub async fn search_by_last_name(&self, last_name: &str) -> Result<Vec<Patient>> {
        let last_name = non_blank(last_name)?;
        self.store
            .list_patients(&PatientFilter {
                last_name: Some(last_name),
                ..Default::default()
            })
            .await
    }

    pub async fn with_emergency_contact(&self) -> Result<Vec<Patient>> {
        self.store
            .list_patients(&PatientFilter {
                has_emergency_contact: true,
                ..Default::default()
            })
            .await
    }

    pub async fn count(&self) -> Result<u64> {
        self.store.count_patients().await
    }

    /// Replaces the patient profile and, when given, the phone number
    pub async fn update(&self, id: UserId, update: PatientUpdate) -> Result<Patient> {
        update.profile.validate()?;
        let mut patient = self.get(id).await?;

        patient.profile = update.profile;
        if update.phone.is_some() {
            patient.identity.phone = update.phone;
        }
        patient.identity.updated_at = Utc::now();

        let updated = self
            .store
            .update_patient(&patient)
            .await?
            .ok_or_else(|| ClinicError::not_found("Patient", id))?;
        tracing::info!(patient_id = %id, "Patient profile updated");
        Ok(updated)
    }

    /// Removes the patient together with the underlying identity
    pub async fn delete(&self, id: UserId) -> Result<()> {
        self.get(id).await?;
        if !self.store.delete_identity(id).await? {
            return Err(ClinicError::not_found("Patient", id));
        }
        tracing::info!(patient_id = %id, "Patient deleted");
        Ok(())
    }
}

fn non_blank(value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ClinicError::invalid("Search term cannot be empty"));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::{IdentityDraft, Role};
    use chrono::NaiveDate;

    async fn seeded(first: &str, last: &str, contact: Option<&str>) -> (Arc<MemoryStore>, UserId) {
        let store = Arc::new(MemoryStore::new());
        let id = add(&store, first, last, contact).await;
        (store, id)
    }

    async fn add(store: &Arc<MemoryStore>, first: &str, last: &str, contact: Option<&str>) -> UserId {
        let identity = store
            .insert_identity(IdentityDraft {
                username: first.to_lowercase(),
                email: format!("{}@clinic.test", first.to_lowercase()),
                password_hash: "hash".to_string(),
                first_name: first.to_string(),
                last_name: last.to_string(),
                phone: None,
                role: Role::Patient,
            })
            .await
            .unwrap();
        PatientService::new(store.clone())
            .create(
                identity.id,
                PatientProfile {
                    emergency_contact: contact.map(str::to_string),
                    blood_type: Some("O+".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        identity.id
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let (store, id) = seeded("Ann", "Lee", Some("Bob 555-0102")).await;
        let patients = PatientService::new(store);
        let patient = patients.get(id).await.unwrap();
        assert_eq!(patient.profile.blood_type.as_deref(), Some("O+"));
        assert_eq!(patient.identity.last_name, "Lee");
        assert_eq!(
            patients.get_by_email("ann@clinic.test").await.unwrap().id(),
            id
        );
    }

    #[tokio::test]
    async fn test_rejects_bad_blood_type_and_future_birth() {
        let (store, id) = seeded("Ann", "Lee", None).await;
        let patients = PatientService::new(store);
        let err = patients
            .update(
                id,
                PatientUpdate {
                    profile: PatientProfile {
                        blood_type: Some("C+".to_string()),
                        date_of_birth: NaiveDate::from_ymd_opt(2999, 1, 1),
                        ..Default::default()
                    },
                    phone: None,
                },
            )
            .await
            .unwrap_err();
        match err {
            ClinicError::InvalidRequest { field_errors, .. } => assert_eq!(field_errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_searches() {
        let (store, _) = seeded("Ann", "Lee", Some("Bob 555-0102")).await;
        add(&store, "Mark", "Leeds", None).await;
        add(&store, "Zoe", "Annan", None).await;
        let patients = PatientService::new(store);

        assert_eq!(patients.search("ann").await.unwrap().len(), 2);
        assert_eq!(patients.search_by_last_name("LEE").await.unwrap().len(), 2);
        assert_eq!(patients.with_emergency_contact().await.unwrap().len(), 1);
        assert_eq!(patients.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_profile_requires_patient_role() {
        let store = Arc::new(MemoryStore::new());
        let doctor = store
            .insert_identity(IdentityDraft {
                username: "greg".to_string(),
                email: "greg@clinic.test".to_string(),
                password_hash: "hash".to_string(),
                first_name: "Greg".to_string(),
                last_name: "House".to_string(),
                phone: None,
                role: Role::Doctor,
            })
            .await
            .unwrap();
        let err = PatientService::new(store)
            .create(doctor.id, PatientProfile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::InvalidRequest { .. }));
    }
}
