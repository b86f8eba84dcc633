//! Identity domain model
//!
//! An [`Identity`] is the base account record (credentials + role). Clinicians
//! and patients attach a role specialization to an identity under the same id
//! instead of extending it: a [`Doctor`] is an identity plus a
//! [`ClinicianProfile`], a [`Patient`] is an identity plus a
//! [`PatientProfile`]. The role tag selects which specialization may exist.

use super::errors::{ClinicError, FieldError, Validator};
use super::ids::UserId;
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Account role, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Clinic administrator
    #[serde(alias = "ADMIN")]
    Admin,
    /// Clinician
    #[serde(alias = "DOCTOR")]
    Doctor,
    /// Patient
    #[serde(alias = "PATIENT")]
    Patient,
}

impl Role {
    /// Returns the canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            _ => Err(format!(
                "Invalid role '{s}'. Must be one of: admin, doctor, patient"
            )),
        }
    }
}

/// Base identity record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// bcrypt hash; never leaves the process
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input (plain password, hashed by the auth service)
#[derive(Debug, Clone, Deserialize)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
}

impl NewIdentity {
    /// Checks field shapes: username 3-50 chars, valid email, password of at
    /// least 6 chars, non-blank names
    pub fn validate(&self) -> Result<(), ClinicError> {
        let username_len = self.username.trim().chars().count();
        Validator::new()
            .check((3..=50).contains(&username_len), || {
                FieldError::new("username", "Username must be between 3 and 50 characters")
                    .with_value(&self.username)
            })
            .check(is_valid_email(&self.email), || {
                FieldError::new("email", "Email should be valid").with_value(&self.email)
            })
            .check(self.password.chars().count() >= 6, || {
                FieldError::new("password", "Password must be at least 6 characters")
            })
            .require("first_name", &self.first_name)
            .require("last_name", &self.last_name)
            .finish()
    }
}

/// Identity record ready for insertion (password already hashed)
#[derive(Debug, Clone)]
pub struct IdentityDraft {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Mutable profile fields of an identity (role is not among them)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl IdentityUpdate {
    /// Checks any field that is present
    pub fn validate(&self) -> Result<(), ClinicError> {
        let mut v = Validator::new();
        if let Some(email) = &self.email {
            v.check(is_valid_email(email), || {
                FieldError::new("email", "Email should be valid").with_value(email)
            });
        }
        if let Some(first) = &self.first_name {
            v.require("first_name", first);
        }
        if let Some(last) = &self.last_name {
            v.require("last_name", last);
        }
        v.finish()
    }

    /// Applies the present fields to `identity`
    pub fn apply(&self, identity: &mut Identity) {
        if let Some(email) = &self.email {
            identity.email = email.trim().to_string();
        }
        if let Some(first) = &self.first_name {
            identity.first_name = first.trim().to_string();
        }
        if let Some(last) = &self.last_name {
            identity.last_name = last.trim().to_string();
        }
        if self.phone.is_some() {
            identity.phone = self.phone.clone();
        }
        identity.updated_at = Utc::now();
    }
}

/// Clinician specialization of an identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicianProfile {
    pub specialization: String,
    pub license_number: String,
    #[serde(default)]
    pub years_of_experience: i32,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub consultation_fee: Option<f64>,
}

impl ClinicianProfile {
    pub fn validate(&self) -> Result<(), ClinicError> {
        Validator::new()
            .require("specialization", &self.specialization)
            .require("license_number", &self.license_number)
            .check(self.years_of_experience >= 0, || {
                FieldError::new("years_of_experience", "Years of experience cannot be negative")
                    .with_value(self.years_of_experience)
            })
            .check(self.consultation_fee.map_or(true, |fee| fee >= 0.0), || {
                FieldError::new("consultation_fee", "Consultation fee cannot be negative")
                    .with_value(self.consultation_fee)
            })
            .finish()
    }
}

/// Clinician view: identity plus clinician profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Doctor {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(flatten)]
    pub profile: ClinicianProfile,
}

impl Doctor {
    pub fn id(&self) -> UserId {
        self.identity.id
    }
}

/// Mutable clinician fields; the license number is fixed once issued
#[derive(Debug, Clone, Deserialize)]
pub struct DoctorUpdate {
    pub specialization: String,
    #[serde(default)]
    pub years_of_experience: i32,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub consultation_fee: Option<f64>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl DoctorUpdate {
    /// Applies the update, returning the validated profile
    pub fn apply(&self, doctor: &mut Doctor) -> Result<(), ClinicError> {
        let profile = ClinicianProfile {
            specialization: self.specialization.trim().to_string(),
            license_number: doctor.profile.license_number.clone(),
            years_of_experience: self.years_of_experience,
            qualification: self.qualification.clone(),
            consultation_fee: self.consultation_fee,
        };
        profile.validate()?;
        doctor.profile = profile;
        if self.phone.is_some() {
            doctor.identity.phone = self.phone.clone();
        }
        doctor.identity.updated_at = Utc::now();
        Ok(())
    }
}

const BLOOD_TYPES: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

/// Patient specialization of an identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub blood_type: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub insurance_info: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl PatientProfile {
    pub fn validate(&self) -> Result<(), ClinicError> {
        let today = Utc::now().date_naive();
        Validator::new()
            .check(
                self.blood_type
                    .as_deref()
                    .map_or(true, |bt| BLOOD_TYPES.contains(&bt)),
                || {
                    FieldError::new(
                        "blood_type",
                        format!("Blood type must be one of: {}", BLOOD_TYPES.join(", ")),
                    )
                    .with_value(&self.blood_type)
                },
            )
            .check(self.date_of_birth.map_or(true, |dob| dob <= today), || {
                FieldError::new("date_of_birth", "Date of birth cannot be in the future")
                    .with_value(self.date_of_birth)
            })
            .finish()
    }
}

/// Patient view: identity plus patient profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patient {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(flatten)]
    pub profile: PatientProfile,
}

impl Patient {
    pub fn id(&self) -> UserId {
        self.identity.id
    }
}

/// Mutable patient fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientUpdate {
    #[serde(flatten)]
    pub profile: PatientProfile,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Role specialization payload keyed by identity id
#[derive(Debug, Clone, PartialEq)]
pub enum RoleProfile {
    Clinician(ClinicianProfile),
    Patient(PatientProfile),
}

impl RoleProfile {
    /// The only role allowed to carry this profile
    pub fn required_role(&self) -> Role {
        match self {
            RoleProfile::Clinician(_) => Role::Doctor,
            RoleProfile::Patient(_) => Role::Patient,
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
    })
}

/// Minimal structural email check
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}
