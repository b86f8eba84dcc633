//! Clinical-note documents on PostgreSQL
//!
//! Each note is stored whole in a JSONB `document` column. The scalar columns
//! next to it duplicate the fields that filters and ordering use.

use crate::adapters::database::traits::{MedicalRecordFilter, NoteStore, PrescriptionFilter};
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::models::{count_from_row, document_from_row, like_pattern, SqlFilter};
use crate::domain::{MedicalRecord, NoteId, Prescription, Result};
use async_trait::async_trait;

fn prescription_filter(filter: &PrescriptionFilter) -> SqlFilter {
    let mut sql = SqlFilter::new();
    if let Some(id) = filter.patient_id {
        sql.push("patient_id = {}", id);
    }
    if let Some(id) = filter.doctor_id {
        sql.push("doctor_id = {}", id);
    }
    if let Some(id) = filter.appointment_id {
        sql.push("appointment_id = {}", id);
    }
    if let Some(active) = filter.active {
        sql.push("active = {}", active);
    }
    if let Some(diagnosis) = &filter.diagnosis {
        sql.push("diagnosis ILIKE {}", like_pattern(diagnosis));
    }
    if let Some(from) = filter.from {
        sql.push("prescription_date >= {}", from);
    }
    if let Some(to) = filter.to {
        sql.push("prescription_date <= {}", to);
    }
    sql
}

fn medical_record_filter(filter: &MedicalRecordFilter) -> SqlFilter {
    let mut sql = SqlFilter::new();
    if let Some(id) = filter.patient_id {
        sql.push("patient_id = {}", id);
    }
    if let Some(id) = filter.doctor_id {
        sql.push("doctor_id = {}", id);
    }
    if let Some(diagnosis) = &filter.diagnosis {
        sql.push("diagnosis ILIKE {}", like_pattern(diagnosis));
    }
    if let Some(follow_up) = filter.follow_up_required {
        sql.push("follow_up_required = {}", follow_up);
    }
    if let Some(test) = &filter.lab_test {
        sql.push(
            "EXISTS (SELECT 1 FROM jsonb_array_elements(document->'lab_results') lab \
             WHERE lab->>'test_name' ILIKE {})",
            like_pattern(test),
        );
    }
    if let Some(from) = filter.from {
        sql.push("visit_date >= {}", from);
    }
    if let Some(to) = filter.to {
        sql.push("visit_date <= {}", to);
    }
    sql
}

/// ` LIMIT $n` when a limit is set
fn limit_clause(sql: &mut SqlFilter, limit: Option<usize>) -> String {
    match limit {
        Some(limit) => format!(" LIMIT {}", sql.bind(limit as i64)),
        None => String::new(),
    }
}

#[async_trait]
impl NoteStore for PostgreSQLAdapter {
    fn backend_name(&self) -> &'static str {
        "postgresql"
    }

    async fn test_connection(&self) -> Result<()> {
        self.client().test_connection().await
    }

    async fn insert_prescription(&self, prescription: &Prescription) -> Result<()> {
        let document = serde_json::to_value(prescription)?;
        self.client()
            .execute(
                "INSERT INTO prescriptions (id, patient_id, doctor_id, appointment_id, active, \
                 diagnosis, prescription_date, document) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                &[
                    &prescription.id.as_str(),
                    &prescription.patient_id,
                    &prescription.doctor_id,
                    &prescription.appointment_id,
                    &prescription.active,
                    &prescription.diagnosis,
                    &prescription.prescription_date,
                    &document,
                ],
            )
            .await?;
        Ok(())
    }

    async fn get_prescription(&self, id: &NoteId) -> Result<Option<Prescription>> {
        let rows = self
            .client()
            .query(
                "SELECT document FROM prescriptions WHERE id = $1",
                &[&id.as_str()],
            )
            .await?;
        rows.first().map(document_from_row).transpose()
    }

    async fn list_prescriptions(&self, filter: &PrescriptionFilter) -> Result<Vec<Prescription>> {
        let mut sql = prescription_filter(filter);
        let limit = limit_clause(&mut sql, filter.limit);
        let query = format!(
            "SELECT document FROM prescriptions{} ORDER BY prescription_date DESC, id{limit}",
            sql.where_clause()
        );
        let rows = self.client().query(&query, &sql.params()).await?;
        rows.iter().map(document_from_row).collect()
    }

    async fn count_prescriptions(&self, filter: &PrescriptionFilter) -> Result<u64> {
        let sql = prescription_filter(filter);
        let query = format!("SELECT COUNT(*) FROM prescriptions{}", sql.where_clause());
        let rows = self.client().query(&query, &sql.params()).await?;
        count_from_row(rows.first())
    }

    async fn replace_prescription(&self, prescription: &Prescription) -> Result<bool> {
        let document = serde_json::to_value(prescription)?;
        let updated = self
            .client()
            .execute(
                "UPDATE prescriptions SET patient_id = $2, doctor_id = $3, appointment_id = $4, \
                 active = $5, diagnosis = $6, prescription_date = $7, document = $8 WHERE id = $1",
                &[
                    &prescription.id.as_str(),
                    &prescription.patient_id,
                    &prescription.doctor_id,
                    &prescription.appointment_id,
                    &prescription.active,
                    &prescription.diagnosis,
                    &prescription.prescription_date,
                    &document,
                ],
            )
            .await?;
        Ok(updated > 0)
    }

    async fn delete_prescription(&self, id: &NoteId) -> Result<bool> {
        let deleted = self
            .client()
            .execute("DELETE FROM prescriptions WHERE id = $1", &[&id.as_str()])
            .await?;
        Ok(deleted > 0)
    }

    async fn insert_medical_record(&self, record: &MedicalRecord) -> Result<()> {
        let document = serde_json::to_value(record)?;
        self.client()
            .execute(
                "INSERT INTO medical_records (id, patient_id, doctor_id, diagnosis, visit_date, \
                 follow_up_required, document) VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    &record.id.as_str(),
                    &record.patient_id,
                    &record.doctor_id,
                    &record.diagnosis,
                    &record.visit_date,
                    &record.follow_up_required,
                    &document,
                ],
            )
            .await?;
        Ok(())
    }

    async fn get_medical_record(&self, id: &NoteId) -> Result<Option<MedicalRecord>> {
        let rows = self
            .client()
            .query(
                "SELECT document FROM medical_records WHERE id = $1",
                &[&id.as_str()],
            )
            .await?;
        rows.first().map(document_from_row).transpose()
    }

    async fn list_medical_records(
        &self,
        filter: &MedicalRecordFilter,
    ) -> Result<Vec<MedicalRecord>> {
        let mut sql = medical_record_filter(filter);
        let limit = limit_clause(&mut sql, filter.limit);
        let query = format!(
            "SELECT document FROM medical_records{} ORDER BY visit_date DESC, id{limit}",
            sql.where_clause()
        );
        let rows = self.client().query(&query, &sql.params()).await?;
        rows.iter().map(document_from_row).collect()
    }

    async fn count_medical_records(&self, filter: &MedicalRecordFilter) -> Result<u64> {
        let sql = medical_record_filter(filter);
        let query = format!("SELECT COUNT(*) FROM medical_records{}", sql.where_clause());
        let rows = self.client().query(&query, &sql.params()).await?;
        count_from_row(rows.first())
    }

    async fn replace_medical_record(&self, record: &MedicalRecord) -> Result<bool> {
        let document = serde_json::to_value(record)?;
        let updated = self
            .client()
            .execute(
                "UPDATE medical_records SET patient_id = $2, doctor_id = $3, diagnosis = $4, \
                 visit_date = $5, follow_up_required = $6, document = $7 WHERE id = $1",
                &[
                    &record.id.as_str(),
                    &record.patient_id,
                    &record.doctor_id,
                    &record.diagnosis,
                    &record.visit_date,
                    &record.follow_up_required,
                    &document,
                ],
            )
            .await?;
        Ok(updated > 0)
    }

    async fn delete_medical_record(&self, id: &NoteId) -> Result<bool> {
        let deleted = self
            .client()
            .execute("DELETE FROM medical_records WHERE id = $1", &[&id.as_str()])
            .await?;
        Ok(deleted > 0)
    }
}
