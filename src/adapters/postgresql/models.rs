//! Row mapping between PostgreSQL tables and domain types

use crate::domain::{
    Appointment, AppointmentId, AppointmentStatus, ClinicError, ClinicianProfile, Doctor,
    Identity, Patient, PatientProfile, Result, Role, UserId,
};
use serde::de::DeserializeOwned;
use std::str::FromStr;
use tokio_postgres::Row;

/// Identity columns, `users` aliased as `u`
pub const USER_COLUMNS: &str = "u.id, u.username, u.email, u.password_hash, u.first_name, \
     u.last_name, u.phone, u.role, u.created_at, u.updated_at";

/// Identity plus clinician columns, `doctors` aliased as `d`
pub const DOCTOR_COLUMNS: &str = "u.id, u.username, u.email, u.password_hash, u.first_name, \
     u.last_name, u.phone, u.role, u.created_at, u.updated_at, d.specialization, \
     d.license_number, d.years_of_experience, d.qualification, d.consultation_fee";

/// Identity plus patient columns, `patients` aliased as `p`
pub const PATIENT_COLUMNS: &str = "u.id, u.username, u.email, u.password_hash, u.first_name, \
     u.last_name, u.phone, u.role, u.created_at, u.updated_at, p.date_of_birth, \
     p.blood_type, p.emergency_contact, p.insurance_info, p.address";

pub const APPOINTMENT_COLUMNS: &str =
    "id, patient_id, doctor_id, appointment_date, status, notes, created_at, updated_at";

fn column<'a, T: tokio_postgres::types::FromSql<'a>>(row: &'a Row, name: &str) -> Result<T> {
    row.try_get(name)
        .map_err(|e| ClinicError::Database(format!("Failed to read column '{name}': {e}")))
}

fn user_id(raw: i64) -> Result<UserId> {
    UserId::new(raw).map_err(ClinicError::Database)
}

pub fn identity_from_row(row: &Row) -> Result<Identity> {
    let role: String = column(row, "role")?;
    Ok(Identity {
        id: user_id(column(row, "id")?)?,
        username: column(row, "username")?,
        email: column(row, "email")?,
        password_hash: column(row, "password_hash")?,
        first_name: column(row, "first_name")?,
        last_name: column(row, "last_name")?,
        phone: column(row, "phone")?,
        role: Role::from_str(&role).map_err(ClinicError::Database)?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

pub fn doctor_from_row(row: &Row) -> Result<Doctor> {
    Ok(Doctor {
        identity: identity_from_row(row)?,
        profile: ClinicianProfile {
            specialization: column(row, "specialization")?,
            license_number: column(row, "license_number")?,
            years_of_experience: column(row, "years_of_experience")?,
            qualification: column(row, "qualification")?,
            consultation_fee: column(row, "consultation_fee")?,
        },
    })
}

pub fn patient_from_row(row: &Row) -> Result<Patient> {
    Ok(Patient {
        identity: identity_from_row(row)?,
        profile: PatientProfile {
            date_of_birth: column(row, "date_of_birth")?,
            blood_type: column(row, "blood_type")?,
            emergency_contact: column(row, "emergency_contact")?,
            insurance_info: column(row, "insurance_info")?,
            address: column(row, "address")?,
        },
    })
}

pub fn appointment_from_row(row: &Row) -> Result<Appointment> {
    let status: String = column(row, "status")?;
    Ok(Appointment {
        id: AppointmentId::new(column(row, "id")?).map_err(ClinicError::Database)?,
        patient_id: user_id(column(row, "patient_id")?)?,
        doctor_id: user_id(column(row, "doctor_id")?)?,
        appointment_date: column(row, "appointment_date")?,
        status: AppointmentStatus::from_str(&status).map_err(ClinicError::Database)?,
        notes: column(row, "notes")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

/// Decodes the JSONB `document` column
pub fn document_from_row<T: DeserializeOwned>(row: &Row) -> Result<T> {
    let document: serde_json::Value = column(row, "document")?;
    Ok(serde_json::from_value(document)?)
}

pub fn count_from_row(row: Option<&Row>) -> Result<u64> {
    match row {
        Some(row) => {
            let count: i64 = row
                .try_get(0)
                .map_err(|e| ClinicError::Database(format!("Failed to read count: {e}")))?;
            Ok(count.max(0) as u64)
        }
        None => Ok(0),
    }
}

/// Dynamic `WHERE` clause with numbered parameters
#[derive(Default)]
pub struct SqlFilter {
    clauses: Vec<String>,
    params: Vec<Box<dyn tokio_postgres::types::ToSql + Sync + Send>>,
}

impl SqlFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition; `{}` in `template` is replaced by the parameter placeholder
    pub fn push<T>(&mut self, template: &str, value: T) -> &mut Self
    where
        T: tokio_postgres::types::ToSql + Sync + Send + 'static,
    {
        self.params.push(Box::new(value));
        let placeholder = format!("${}", self.params.len());
        self.clauses.push(template.replace("{}", &placeholder));
        self
    }

    /// Adds a condition without a parameter
    pub fn push_raw(&mut self, clause: &str) -> &mut Self {
        self.clauses.push(clause.to_string());
        self
    }

    /// Adds a bound parameter without a clause (e.g. for LIMIT); returns its placeholder
    pub fn bind<T>(&mut self, value: T) -> String
    where
        T: tokio_postgres::types::ToSql + Sync + Send + 'static,
    {
        self.params.push(Box::new(value));
        format!("${}", self.params.len())
    }

    /// ` WHERE a AND b`, or empty
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> Vec<&(dyn tokio_postgres::types::ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| &**p as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect()
    }
}

/// `%fragment%` for ILIKE, with LIKE wildcards in the fragment escaped
pub fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_filter_numbering() {
        let mut filter = SqlFilter::new();
        filter
            .push("doctor_id = {}", 7_i64)
            .push_raw("active")
            .push("LOWER(diagnosis) LIKE {}", "%flu%".to_string());
        assert_eq!(
            filter.where_clause(),
            " WHERE doctor_id = $1 AND active AND LOWER(diagnosis) LIKE $2"
        );
        assert_eq!(filter.bind(10_i64), "$3");
        assert_eq!(filter.params().len(), 3);
    }

    #[test]
    fn test_empty_filter() {
        assert_eq!(SqlFilter::new().where_clause(), "");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("flu"), "%flu%");
        assert_eq!(like_pattern("50%_x"), "%50\\%\\_x%");
    }
}
