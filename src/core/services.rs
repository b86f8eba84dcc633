//! Service bundle shared by every request handler

use crate::adapters::database::{ClinicStore, NoteStore};
use crate::config::schema::ClinicConfig;
use crate::core::auth::AuthService;
use crate::core::directory::{DoctorService, PatientService, UserService};
use crate::core::notes::{MedicalRecordService, PrescriptionService};
use crate::core::scheduling::AppointmentService;
use std::sync::Arc;

/// All domain services over one pair of stores
pub struct ClinicServices {
    pub auth: AuthService,
    pub users: UserService,
    pub doctors: DoctorService,
    pub patients: PatientService,
    pub appointments: AppointmentService,
    pub prescriptions: PrescriptionService,
    pub medical_records: MedicalRecordService,
}

impl ClinicServices {
    pub fn new(
        config: &ClinicConfig,
        store: Arc<dyn ClinicStore>,
        notes: Arc<dyn NoteStore>,
    ) -> Self {
        Self {
            auth: AuthService::new(store.clone(), &config.auth),
            users: UserService::new(store.clone()),
            doctors: DoctorService::new(store.clone()),
            patients: PatientService::new(store.clone()),
            appointments: AppointmentService::new(store, &config.booking),
            prescriptions: PrescriptionService::new(notes.clone()),
            medical_records: MedicalRecordService::new(notes),
        }
    }
}
