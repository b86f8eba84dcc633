//! Clinical-note documents: prescriptions and medical records
//!
//! Notes reference patients, clinicians and appointments by plain numeric id.
//! Those references are never checked against the relational store.

use super::errors::{ClinicError, FieldError, Validator};
use super::ids::NoteId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One prescribed medication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Prescription document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: NoteId,
    pub appointment_id: Option<i64>,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub diagnosis: String,
    pub medications: Vec<Medication>,
    pub instructions: Option<String>,
    pub prescription_date: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Prescription creation input
#[derive(Debug, Clone, Deserialize)]
pub struct NewPrescription {
    #[serde(default)]
    pub appointment_id: Option<i64>,
    pub patient_id: i64,
    pub doctor_id: i64,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    pub diagnosis: String,
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub prescription_date: Option<DateTime<Utc>>,
}

impl NewPrescription {
    pub fn validate(&self) -> Result<(), ClinicError> {
        validate_medications(Validator::new().require("diagnosis", &self.diagnosis), &self.medications)
            .finish()
    }

    /// Builds the stored document: fresh id, active, dated now unless given
    pub fn into_document(self) -> Prescription {
        let now = Utc::now();
        Prescription {
            id: NoteId::generate(),
            appointment_id: self.appointment_id,
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            patient_name: self.patient_name,
            doctor_name: self.doctor_name,
            diagnosis: self.diagnosis.trim().to_string(),
            medications: self.medications,
            instructions: self.instructions,
            prescription_date: self.prescription_date.unwrap_or(now),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Editable prescription content; the active flag is deliberately absent
#[derive(Debug, Clone, Deserialize)]
pub struct PrescriptionUpdate {
    pub diagnosis: String,
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl PrescriptionUpdate {
    pub fn validate(&self) -> Result<(), ClinicError> {
        validate_medications(Validator::new().require("diagnosis", &self.diagnosis), &self.medications)
            .finish()
    }

    pub fn apply(self, prescription: &mut Prescription) {
        prescription.diagnosis = self.diagnosis.trim().to_string();
        prescription.medications = self.medications;
        prescription.instructions = self.instructions;
        prescription.updated_at = Utc::now();
    }
}

fn validate_medications<'a>(v: &'a mut Validator, medications: &[Medication]) -> &'a mut Validator {
    v.check(!medications.is_empty(), || {
        FieldError::new("medications", "At least one medication is required")
    });
    for (i, medication) in medications.iter().enumerate() {
        v.require(&format!("medications[{i}].name"), &medication.name)
            .require(&format!("medications[{i}].dosage"), &medication.dosage);
    }
    v
}

/// Vital signs captured at a visit; every reading is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    #[serde(default)]
    pub blood_pressure_systolic: Option<f64>,
    #[serde(default)]
    pub blood_pressure_diastolic: Option<f64>,
    #[serde(default)]
    pub heart_rate: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub respiratory_rate: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl VitalSigns {
    fn readings(&self) -> [(&'static str, Option<f64>); 7] {
        [
            ("vital_signs.blood_pressure_systolic", self.blood_pressure_systolic),
            ("vital_signs.blood_pressure_diastolic", self.blood_pressure_diastolic),
            ("vital_signs.heart_rate", self.heart_rate),
            ("vital_signs.temperature", self.temperature),
            ("vital_signs.respiratory_rate", self.respiratory_rate),
            ("vital_signs.weight", self.weight),
            ("vital_signs.height", self.height),
        ]
    }
}

/// One lab test result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    pub test_name: String,
    pub result: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub normal_range: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Medical record document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: NoteId,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub doctor_name: Option<String>,
    pub visit_date: DateTime<Utc>,
    pub diagnosis: String,
    pub symptoms: Vec<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub vital_signs: Option<VitalSigns>,
    pub lab_results: Vec<LabResult>,
    pub follow_up_required: bool,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Medical record content as submitted (create and full update)
#[derive(Debug, Clone, Deserialize)]
pub struct MedicalRecordInput {
    pub patient_id: i64,
    pub doctor_id: i64,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub visit_date: Option<DateTime<Utc>>,
    pub diagnosis: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub treatment: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub vital_signs: Option<VitalSigns>,
    #[serde(default)]
    pub lab_results: Vec<LabResult>,
    #[serde(default)]
    pub follow_up_required: bool,
    #[serde(default)]
    pub follow_up_date: Option<DateTime<Utc>>,
}

impl MedicalRecordInput {
    pub fn validate(&self) -> Result<(), ClinicError> {
        let mut v = Validator::new();
        v.require("diagnosis", &self.diagnosis);
        if let Some(vitals) = &self.vital_signs {
            for (field, reading) in vitals.readings() {
                if let Some(value) = reading {
                    v.check(value > 0.0, || {
                        FieldError::new(field, "Reading must be positive").with_value(value)
                    });
                }
            }
        }
        for (i, lab) in self.lab_results.iter().enumerate() {
            v.require(&format!("lab_results[{i}].test_name"), &lab.test_name);
        }
        v.check(self.follow_up_required || self.follow_up_date.is_none(), || {
            FieldError::new(
                "follow_up_date",
                "Follow-up date requires follow_up_required = true",
            )
        });
        v.finish()
    }

    pub fn into_document(self) -> MedicalRecord {
        let now = Utc::now();
        MedicalRecord {
            id: NoteId::generate(),
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            doctor_name: self.doctor_name,
            visit_date: self.visit_date.unwrap_or(now),
            diagnosis: self.diagnosis.trim().to_string(),
            symptoms: self.symptoms,
            treatment: self.treatment,
            notes: self.notes,
            vital_signs: self.vital_signs,
            lab_results: self.lab_results,
            follow_up_required: self.follow_up_required,
            follow_up_date: self.follow_up_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites `record` with this content, keeping id and creation time
    pub fn apply(self, record: &mut MedicalRecord) {
        let id = record.id.clone();
        let created_at = record.created_at;
        let visit_date = self.visit_date.unwrap_or(record.visit_date);
        *record = self.into_document();
        record.id = id;
        record.created_at = created_at;
        record.visit_date = visit_date;
    }
}

/// Case-insensitive substring match used by the diagnosis and lab-test filters
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medication() -> Medication {
        Medication {
            name: "Lisinopril".to_string(),
            dosage: "10 mg".to_string(),
            frequency: Some("daily".to_string()),
            duration: None,
            instructions: None,
        }
    }

    fn new_prescription() -> NewPrescription {
        NewPrescription {
            appointment_id: Some(1),
            patient_id: 1,
            doctor_id: 2,
            patient_name: None,
            doctor_name: None,
            diagnosis: "Hypertension".to_string(),
            medications: vec![medication()],
            instructions: None,
            prescription_date: None,
        }
    }

    #[test]
    fn test_new_prescription_defaults() {
        let doc = new_prescription().into_document();
        assert!(doc.active);
        assert_eq!(doc.diagnosis, "Hypertension");
        assert_eq!(doc.id.as_str().len(), 36);
    }

    #[test]
    fn test_prescription_requires_medications() {
        let mut input = new_prescription();
        input.medications.clear();
        assert!(input.validate().is_err());

        let mut input = new_prescription();
        input.medications[0].dosage = String::new();
        match input.validate() {
            Err(ClinicError::InvalidRequest { field_errors, .. }) => {
                assert_eq!(field_errors[0].field, "medications[0].dosage");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_prescription_update_keeps_active_flag() {
        let mut doc = new_prescription().into_document();
        doc.active = false;
        PrescriptionUpdate {
            diagnosis: "Stage 2 hypertension".to_string(),
            medications: vec![medication()],
            instructions: Some("Reduce salt".to_string()),
        }
        .apply(&mut doc);
        assert!(!doc.active);
        assert_eq!(doc.diagnosis, "Stage 2 hypertension");
    }

    #[test]
    fn test_medical_record_validation() {
        let mut input = MedicalRecordInput {
            patient_id: 1,
            doctor_id: 2,
            doctor_name: None,
            visit_date: None,
            diagnosis: "Type 2 diabetes".to_string(),
            symptoms: vec!["fatigue".to_string()],
            treatment: None,
            notes: None,
            vital_signs: Some(VitalSigns {
                heart_rate: Some(72.0),
                ..Default::default()
            }),
            lab_results: vec![],
            follow_up_required: false,
            follow_up_date: None,
        };
        assert!(input.validate().is_ok());

        input.follow_up_date = Some(Utc::now());
        assert!(input.validate().is_err());

        input.follow_up_required = true;
        assert!(input.validate().is_ok());

        input.vital_signs = Some(VitalSigns {
            temperature: Some(-1.0),
            ..Default::default()
        });
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Type 2 Diabetes", "diabetes"));
        assert!(!contains_ignore_case("Hypertension", "diabetes"));
    }
}
