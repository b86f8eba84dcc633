//! PostgreSQL adapter implementing the relational store
//!
//! Identities, role profiles and appointments. The clinical-note side of the
//! same adapter lives in [`super::documents`].

use crate::adapters::database::traits::{
    AppointmentFilter, BookingOutcome, ClinicStore, DoctorFilter, PatientFilter,
};
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{
    appointment_from_row, count_from_row, doctor_from_row, identity_from_row, like_pattern,
    patient_from_row, SqlFilter, APPOINTMENT_COLUMNS, DOCTOR_COLUMNS, PATIENT_COLUMNS,
    USER_COLUMNS,
};
use crate::domain::context::ResultExt;
use crate::domain::{
    Appointment, AppointmentId, ClinicError, ClinicianProfile, Doctor, Identity, IdentityDraft,
    NewAppointment, Page, PageRequest, Patient, PatientProfile, Result, Role, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// PostgreSQL implementation of the store traits
///
/// Wraps a [`PostgreSQLClient`]; both [`ClinicStore`] and
/// [`NoteStore`](crate::adapters::database::NoteStore) share its pool.
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    /// Create a new PostgreSQL adapter with an Arc-wrapped client
    pub fn new_with_arc(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }

    async fn query_doctors(&self, filter: SqlFilter) -> Result<Vec<Doctor>> {
        let sql = format!(
            "SELECT {DOCTOR_COLUMNS} FROM users u JOIN doctors d ON d.user_id = u.id{} ORDER BY u.id",
            filter.where_clause()
        );
        let rows = self.client.query(&sql, &filter.params()).await?;
        rows.iter().map(doctor_from_row).collect()
    }

    async fn query_patients(&self, filter: SqlFilter) -> Result<Vec<Patient>> {
        let sql = format!(
            "SELECT {PATIENT_COLUMNS} FROM users u JOIN patients p ON p.user_id = u.id{} ORDER BY u.id",
            filter.where_clause()
        );
        let rows = self.client.query(&sql, &filter.params()).await?;
        rows.iter().map(patient_from_row).collect()
    }

    async fn identity_exists(&self, id: UserId) -> Result<bool> {
        let rows = self
            .client
            .query("SELECT 1 FROM users WHERE id = $1", &[&id.value()])
            .await?;
        Ok(!rows.is_empty())
    }
}

fn doctor_filter(filter: &DoctorFilter) -> SqlFilter {
    let mut sql = SqlFilter::new();
    if let Some(specialization) = &filter.specialization {
        sql.push("LOWER(d.specialization) = LOWER({})", specialization.clone());
    }
    if let Some(min) = filter.min_experience {
        sql.push("d.years_of_experience >= {}", min);
    }
    sql
}

fn appointment_filter(filter: &AppointmentFilter) -> SqlFilter {
    let mut sql = SqlFilter::new();
    if let Some(id) = filter.patient_id {
        sql.push("patient_id = {}", id.value());
    }
    if let Some(id) = filter.doctor_id {
        sql.push("doctor_id = {}", id.value());
    }
    if let Some(status) = filter.status {
        sql.push("status = {}", status.as_str().to_string());
    }
    if let Some(from) = filter.from {
        sql.push("appointment_date >= {}", from);
    }
    if let Some(to) = filter.to {
        sql.push("appointment_date <= {}", to);
    }
    sql
}

/// Appointments of `doctor_id` within `buffer` of `date`, inside the caller's transaction
async fn clashes_in(
    tx: &tokio_postgres::Transaction<'_>,
    doctor_id: UserId,
    date: DateTime<Utc>,
    buffer: Duration,
    except: Option<AppointmentId>,
) -> Result<Vec<Appointment>> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
         WHERE doctor_id = $1 AND appointment_date BETWEEN $2 AND $3 AND id <> $4 \
         ORDER BY appointment_date"
    );
    let except = except.map_or(0, |id| id.value());
    let rows = tx
        .query(
            &sql,
            &[&doctor_id.value(), &(date - buffer), &(date + buffer), &except],
        )
        .await?;
    rows.iter().map(appointment_from_row).collect()
}

#[async_trait]
impl ClinicStore for PostgreSQLAdapter {
    fn backend_name(&self) -> &'static str {
        "postgresql"
    }

    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.client.ensure_database_exists().await
    }

    async fn insert_identity(&self, draft: IdentityDraft) -> Result<Identity> {
        let sql = format!(
            "INSERT INTO users AS u (username, email, password_hash, first_name, last_name, phone, role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        );
        let role = draft.role.as_str().to_string();
        let rows = self
            .client
            .query(
                &sql,
                &[
                    &draft.username,
                    &draft.email,
                    &draft.password_hash,
                    &draft.first_name,
                    &draft.last_name,
                    &draft.phone,
                    &role,
                ],
            )
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| ClinicError::Database("INSERT returned no row".to_string()))?;
        identity_from_row(row)
    }

    async fn get_identity(&self, id: UserId) -> Result<Option<Identity>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1");
        let rows = self.client.query(&sql, &[&id.value()]).await?;
        rows.first().map(identity_from_row).transpose()
    }

    async fn find_identity_by_username(&self, username: &str) -> Result<Option<Identity>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = $1");
        let rows = self.client.query(&sql, &[&username]).await?;
        rows.first().map(identity_from_row).transpose()
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.email = $1");
        let rows = self.client.query(&sql, &[&email]).await?;
        rows.first().map(identity_from_row).transpose()
    }

    async fn list_identities(&self, page: &PageRequest) -> Result<Page<Identity>> {
        let total_rows = self.client.query("SELECT COUNT(*) FROM users", &[]).await?;
        let total = count_from_row(total_rows.first())?;

        // Column and direction come from closed enums, never from request text
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u ORDER BY u.{col} {dir}, u.id {dir} LIMIT $1 OFFSET $2",
            col = page.sort_by.column(),
            dir = page.direction.sql(),
        );
        let (limit, offset) = page.sql_window()?;
        let rows = self
            .client
            .query(&sql, &[&limit, &offset])
            .await
            .context("Failed to list users")?;
        let content = rows
            .iter()
            .map(identity_from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(content, page, total))
    }

    async fn search_identities(&self, fragment: &str) -> Result<Vec<Identity>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u \
             WHERE u.first_name ILIKE $1 OR u.last_name ILIKE $1 ORDER BY u.id"
        );
        let pattern = like_pattern(fragment);
        let rows = self.client.query(&sql, &[&pattern]).await?;
        rows.iter().map(identity_from_row).collect()
    }

    async fn list_identities_by_role(&self, role: Role) -> Result<Vec<Identity>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.role = $1 ORDER BY u.id");
        let role = role.as_str().to_string();
        let rows = self.client.query(&sql, &[&role]).await?;
        rows.iter().map(identity_from_row).collect()
    }

    async fn update_identity(&self, identity: &Identity) -> Result<Option<Identity>> {
        let sql = format!(
            "UPDATE users AS u SET email = $2, first_name = $3, last_name = $4, phone = $5, \
             updated_at = $6 WHERE u.id = $1 RETURNING {USER_COLUMNS}"
        );
        let rows = self
            .client
            .query(
                &sql,
                &[
                    &identity.id.value(),
                    &identity.email,
                    &identity.first_name,
                    &identity.last_name,
                    &identity.phone,
                    &identity.updated_at,
                ],
            )
            .await?;
        rows.first().map(identity_from_row).transpose()
    }

    async fn delete_identity(&self, id: UserId) -> Result<bool> {
        // Profiles and appointments go with it (ON DELETE CASCADE)
        let deleted = self
            .client
            .execute("DELETE FROM users WHERE id = $1", &[&id.value()])
            .await?;
        Ok(deleted > 0)
    }

    async fn insert_clinician_profile(
        &self,
        id: UserId,
        profile: ClinicianProfile,
    ) -> Result<Doctor> {
        if !self.identity_exists(id).await? {
            return Err(ClinicError::not_found("User", id));
        }
        self.client
            .execute(
                "INSERT INTO doctors (user_id, specialization, license_number, years_of_experience, \
                 qualification, consultation_fee) VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    &id.value(),
                    &profile.specialization,
                    &profile.license_number,
                    &profile.years_of_experience,
                    &profile.qualification,
                    &profile.consultation_fee,
                ],
            )
            .await?;
        self.get_doctor(id)
            .await?
            .ok_or_else(|| ClinicError::not_found("Doctor", id))
    }

    async fn get_doctor(&self, id: UserId) -> Result<Option<Doctor>> {
        let mut filter = SqlFilter::new();
        filter.push("u.id = {}", id.value());
        Ok(self.query_doctors(filter).await?.into_iter().next())
    }

    async fn find_doctor_by_license(&self, license_number: &str) -> Result<Option<Doctor>> {
        let mut filter = SqlFilter::new();
        filter.push("d.license_number = {}", license_number.to_string());
        Ok(self.query_doctors(filter).await?.into_iter().next())
    }

    async fn list_doctors(&self, filter: &DoctorFilter) -> Result<Vec<Doctor>> {
        self.query_doctors(doctor_filter(filter)).await
    }

    async fn list_specializations(&self) -> Result<Vec<String>> {
        let rows = self
            .client
            .query(
                "SELECT DISTINCT specialization FROM doctors ORDER BY specialization",
                &[],
            )
            .await?;
        rows.iter()
            .map(|row| {
                row.try_get(0)
                    .map_err(|e| ClinicError::Database(format!("Failed to read column: {e}")))
            })
            .collect()
    }

    async fn count_doctors(&self, filter: &DoctorFilter) -> Result<u64> {
        let filter = doctor_filter(filter);
        let sql = format!(
            "SELECT COUNT(*) FROM users u JOIN doctors d ON d.user_id = u.id{}",
            filter.where_clause()
        );
        let rows = self.client.query(&sql, &filter.params()).await?;
        count_from_row(rows.first())
    }

    async fn update_doctor(&self, doctor: &Doctor) -> Result<Option<Doctor>> {
        let id = doctor.id();
        let mut conn = self.client.get_connection().await?;
        let tx = conn.transaction().await?;
        tx.batch_execute(&self.client.statement_timeout_sql(true))
            .await?;

        let updated = tx
            .execute(
                "UPDATE doctors SET specialization = $2, years_of_experience = $3, \
                 qualification = $4, consultation_fee = $5 WHERE user_id = $1",
                &[
                    &id.value(),
                    &doctor.profile.specialization,
                    &doctor.profile.years_of_experience,
                    &doctor.profile.qualification,
                    &doctor.profile.consultation_fee,
                ],
            )
            .await?;
        if updated == 0 {
            tx.rollback().await?;
            return Ok(None);
        }
        tx.execute(
            "UPDATE users SET phone = $2, updated_at = $3 WHERE id = $1",
            &[&id.value(), &doctor.identity.phone, &doctor.identity.updated_at],
        )
        .await?;
        tx.commit().await?;

        self.get_doctor(id).await
    }

    async fn insert_patient_profile(
        &self,
        id: UserId,
        profile: PatientProfile,
    ) -> Result<Patient> {
        if !self.identity_exists(id).await? {
            return Err(ClinicError::not_found("User", id));
        }
        self.client
            .execute(
                "INSERT INTO patients (user_id, date_of_birth, blood_type, emergency_contact, \
                 insurance_info, address) VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    &id.value(),
                    &profile.date_of_birth,
                    &profile.blood_type,
                    &profile.emergency_contact,
                    &profile.insurance_info,
                    &profile.address,
                ],
            )
            .await?;
        self.get_patient(id)
            .await?
            .ok_or_else(|| ClinicError::not_found("Patient", id))
    }

    async fn get_patient(&self, id: UserId) -> Result<Option<Patient>> {
        let mut filter = SqlFilter::new();
        filter.push("u.id = {}", id.value());
        Ok(self.query_patients(filter).await?.into_iter().next())
    }

    async fn find_patient_by_email(&self, email: &str) -> Result<Option<Patient>> {
        let mut filter = SqlFilter::new();
        filter.push("u.email = {}", email.to_string());
        Ok(self.query_patients(filter).await?.into_iter().next())
    }

    async fn list_patients(&self, filter: &PatientFilter) -> Result<Vec<Patient>> {
        let mut sql = SqlFilter::new();
        if let Some(name) = &filter.name {
            sql.push(
                "(u.first_name ILIKE {} OR u.last_name ILIKE {})",
                like_pattern(name),
            );
        }
        if let Some(last_name) = &filter.last_name {
            sql.push("u.last_name ILIKE {}", like_pattern(last_name));
        }
        if filter.has_emergency_contact {
            sql.push_raw("p.emergency_contact IS NOT NULL AND btrim(p.emergency_contact) <> ''");
        }
        self.query_patients(sql).await
    }

    async fn count_patients(&self) -> Result<u64> {
        let rows = self
            .client
            .query("SELECT COUNT(*) FROM patients", &[])
            .await?;
        count_from_row(rows.first())
    }

    async fn update_patient(&self, patient: &Patient) -> Result<Option<Patient>> {
        let id = patient.id();
        let mut conn = self.client.get_connection().await?;
        let tx = conn.transaction().await?;
        tx.batch_execute(&self.client.statement_timeout_sql(true))
            .await?;

        let updated = tx
            .execute(
                "UPDATE patients SET date_of_birth = $2, blood_type = $3, emergency_contact = $4, \
                 insurance_info = $5, address = $6 WHERE user_id = $1",
                &[
                    &id.value(),
                    &patient.profile.date_of_birth,
                    &patient.profile.blood_type,
                    &patient.profile.emergency_contact,
                    &patient.profile.insurance_info,
                    &patient.profile.address,
                ],
            )
            .await?;
        if updated == 0 {
            tx.rollback().await?;
            return Ok(None);
        }
        tx.execute(
            "UPDATE users SET phone = $2, updated_at = $3 WHERE id = $1",
            &[&id.value(), &patient.identity.phone, &patient.identity.updated_at],
        )
        .await?;
        tx.commit().await?;

        self.get_patient(id).await
    }

    async fn book_appointment(
        &self,
        candidate: NewAppointment,
        buffer: Duration,
    ) -> Result<BookingOutcome> {
        let mut conn = self.client.get_connection().await?;
        let tx = conn.transaction().await?;
        tx.batch_execute(&self.client.statement_timeout_sql(true))
            .await?;

        // Serializes bookings per clinician until commit/rollback
        tx.execute(
            "SELECT pg_advisory_xact_lock($1)",
            &[&candidate.doctor_id.value()],
        )
        .await
        .context("Failed to lock clinician schedule")?;

        let clashes = clashes_in(
            &tx,
            candidate.doctor_id,
            candidate.appointment_date,
            buffer,
            None,
        )
        .await?;
        if !clashes.is_empty() {
            tx.rollback().await?;
            return Ok(BookingOutcome::Clash(clashes));
        }

        let sql = format!(
            "INSERT INTO appointments (patient_id, doctor_id, appointment_date, status, notes) \
             VALUES ($1, $2, $3, 'scheduled', $4) RETURNING {APPOINTMENT_COLUMNS}"
        );
        let rows = tx
            .query(
                &sql,
                &[
                    &candidate.patient_id.value(),
                    &candidate.doctor_id.value(),
                    &candidate.appointment_date,
                    &candidate.notes,
                ],
            )
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| ClinicError::Database("INSERT returned no row".to_string()))?;
        let appointment = appointment_from_row(row)?;
        tx.commit().await?;

        Ok(BookingOutcome::Saved(appointment))
    }

    async fn get_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>> {
        let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1");
        let rows = self.client.query(&sql, &[&id.value()]).await?;
        rows.first().map(appointment_from_row).transpose()
    }

    async fn list_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>> {
        let filter = appointment_filter(filter);
        let sql = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments{} ORDER BY appointment_date, id",
            filter.where_clause()
        );
        let rows = self.client.query(&sql, &filter.params()).await?;
        rows.iter().map(appointment_from_row).collect()
    }

    async fn count_appointments(&self, filter: &AppointmentFilter) -> Result<u64> {
        let filter = appointment_filter(filter);
        let sql = format!("SELECT COUNT(*) FROM appointments{}", filter.where_clause());
        let rows = self.client.query(&sql, &filter.params()).await?;
        count_from_row(rows.first())
    }

    async fn update_appointment(
        &self,
        appointment: &Appointment,
        conflict_buffer: Option<Duration>,
    ) -> Result<Option<BookingOutcome>> {
        let mut conn = self.client.get_connection().await?;
        let tx = conn.transaction().await?;
        tx.batch_execute(&self.client.statement_timeout_sql(true))
            .await?;

        if let Some(buffer) = conflict_buffer {
            tx.execute(
                "SELECT pg_advisory_xact_lock($1)",
                &[&appointment.doctor_id.value()],
            )
            .await
            .context("Failed to lock clinician schedule")?;

            let clashes = clashes_in(
                &tx,
                appointment.doctor_id,
                appointment.appointment_date,
                buffer,
                Some(appointment.id),
            )
            .await?;
            if !clashes.is_empty() {
                tx.rollback().await?;
                return Ok(Some(BookingOutcome::Clash(clashes)));
            }
        }

        let sql = format!(
            "UPDATE appointments SET appointment_date = $2, status = $3, notes = $4, \
             updated_at = $5 WHERE id = $1 RETURNING {APPOINTMENT_COLUMNS}"
        );
        let status = appointment.status.as_str().to_string();
        let rows = tx
            .query(
                &sql,
                &[
                    &appointment.id.value(),
                    &appointment.appointment_date,
                    &status,
                    &appointment.notes,
                    &appointment.updated_at,
                ],
            )
            .await?;
        let updated = rows.first().map(appointment_from_row).transpose()?;
        tx.commit().await?;

        Ok(updated.map(BookingOutcome::Saved))
    }

    async fn delete_appointment(&self, id: AppointmentId) -> Result<bool> {
        let deleted = self
            .client
            .execute("DELETE FROM appointments WHERE id = $1", &[&id.value()])
            .await?;
        Ok(deleted > 0)
    }
}
