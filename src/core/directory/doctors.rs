//! Clinician profiles

use crate::adapters::database::{ClinicStore, DoctorFilter};
use crate::domain::{
    ClinicError, ClinicianProfile, Doctor, DoctorUpdate, Result, Role, RoleProfile, UserId,
};
use std::sync::Arc;

pub struct DoctorService {
    store: Arc<dyn ClinicStore>,
}

impl DoctorService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    /// Attaches a clinician profile to an existing identity with role doctor
    ///
    /// # Errors
    ///
    /// - `NotFound` when the identity does not exist
    /// - `InvalidRequest` when the profile is malformed or the role is not doctor
    /// - `Conflict` when the license number is taken or a profile already exists
    pub async fn create(&self, id: UserId, profile: ClinicianProfile) -> Result<Doctor> {
        profile.validate()?;
        let identity = self
            .store
            .get_identity(id)
            .await?
            .ok_or_else(|| ClinicError::not_found("User", id))?;
        require_role(identity.role, &RoleProfile::Clinician(profile.clone()))?;

        if self
            .store
            .find_doctor_by_license(&profile.license_number)
            .await?
            .is_some()
        {
            return Err(ClinicError::Conflict(
                "License number already exists".to_string(),
            ));
        }

        let doctor = self.store.insert_clinician_profile(id, profile).await?;
        tracing::info!(
            doctor_id = %id,
            specialization = %doctor.profile.specialization,
            "Clinician profile created"
        );
        Ok(doctor)
    }

    pub async fn get(&self, id: UserId) -> Result<Doctor> {
        self.store
            .get_doctor(id)
            .await?
            .ok_or_else(|| ClinicError::not_found("Doctor", id))
    }

    pub async fn get_by_license(&self, license_number: &str) -> Result<Doctor> {
        self.store
            .find_doctor_by_license(license_number)
            .await?
            .ok_or_else(|| ClinicError::not_found("Doctor", license_number))
    }

    /// All clinicians matching `filter`; an empty filter lists everyone
    pub async fn list(&self, filter: &DoctorFilter) -> Result<Vec<Doctor>> {
        self.store.list_doctors(filter).await
    }

    /// Distinct specializations, sorted
    pub async fn specializations(&self) -> Result<Vec<String>> {
        self.store.list_specializations().await
    }

    pub async fn count(&self, filter: &DoctorFilter) -> Result<u64> {
        self.store.count_doctors(filter).await
    }

    /// Updates the mutable clinician fields; the license number is kept
    pub async fn update(&self, id: UserId, update: DoctorUpdate) -> Result<Doctor> {
        let mut doctor = self.get(id).await?;
        update.apply(&mut doctor)?;
        let updated = self
            .store
            .update_doctor(&doctor)
            .await?
            .ok_or_else(|| ClinicError::not_found("Doctor", id))?;
        tracing::info!(doctor_id = %id, "Clinician profile updated");
        Ok(updated)
    }

    /// Removes the clinician together with the underlying identity
    pub async fn delete(&self, id: UserId) -> Result<()> {
        self.get(id).await?;
        if !self.store.delete_identity(id).await? {
            return Err(ClinicError::not_found("Doctor", id));
        }
        tracing::info!(doctor_id = %id, "Clinician deleted");
        Ok(())
    }
}

/// Rejects a role profile attached to an identity of another role
pub(crate) fn require_role(role: Role, profile: &RoleProfile) -> Result<()> {
    let required = profile.required_role();
    if role != required {
        return Err(ClinicError::invalid(format!(
            "Identity has role '{role}'; this profile requires role '{required}'"
        )));
    }
    Ok(())
}
