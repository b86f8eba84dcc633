//! `/api/medical-records`

use crate::adapters::database::MedicalRecordFilter;
use crate::api::extract::{
    Caller, DateRange, DiagnosisQuery, JsonBody, LatestQuery, PathParams, QueryParams,
};
use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use crate::domain::{MedicalRecord, MedicalRecordInput, NoteId};
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LabTestQuery {
    #[serde(alias = "testName")]
    pub test_name: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/diagnosis", get(by_diagnosis))
        .route("/follow-up", get(follow_ups))
        .route("/follow-up/count", get(count_follow_ups))
        .route("/lab-test", get(by_lab_test))
        .route("/patient/:patient_id", get(by_patient))
        .route("/patient/:patient_id/date-range", get(by_patient_in_range))
        .route("/patient/:patient_id/diagnosis", get(by_patient_and_diagnosis))
        .route("/patient/:patient_id/latest", get(latest))
        .route("/patient/:patient_id/count", get(count_by_patient))
        .route("/doctor/:doctor_id", get(by_doctor))
        .route("/:id", get(get_one).put(update).delete(remove))
}

async fn listing(state: &AppState, filter: MedicalRecordFilter) -> ApiResult<Vec<MedicalRecord>> {
    Ok(ApiResponse::ok(
        state.services.medical_records.list(&filter).await?,
    ))
}

async fn count(state: &AppState, filter: MedicalRecordFilter) -> ApiResult<u64> {
    Ok(ApiResponse::ok(
        state.services.medical_records.count(&filter).await?,
    ))
}

async fn list(State(state): State<AppState>, _caller: Caller) -> ApiResult<Vec<MedicalRecord>> {
    listing(&state, MedicalRecordFilter::default()).await
}

async fn create(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(input): JsonBody<MedicalRecordInput>,
) -> ApiResult<MedicalRecord> {
    caller.require_staff()?;
    let record = state.services.medical_records.create(input).await?;
    Ok(ApiResponse::with_message(
        "Medical record created successfully",
        record,
    ))
}

async fn get_one(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(id): PathParams<NoteId>,
) -> ApiResult<MedicalRecord> {
    Ok(ApiResponse::ok(
        state.services.medical_records.get(&id).await?,
    ))
}

async fn by_diagnosis(
    State(state): State<AppState>,
    _caller: Caller,
    QueryParams(query): QueryParams<DiagnosisQuery>,
) -> ApiResult<Vec<MedicalRecord>> {
    listing(
        &state,
        MedicalRecordFilter {
            diagnosis: Some(query.diagnosis),
            ..Default::default()
        },
    )
    .await
}

async fn follow_ups(
    State(state): State<AppState>,
    _caller: Caller,
) -> ApiResult<Vec<MedicalRecord>> {
    listing(
        &state,
        MedicalRecordFilter {
            follow_up_required: Some(true),
            ..Default::default()
        },
    )
    .await
}

async fn count_follow_ups(State(state): State<AppState>, _caller: Caller) -> ApiResult<u64> {
    count(
        &state,
        MedicalRecordFilter {
            follow_up_required: Some(true),
            ..Default::default()
        },
    )
    .await
}

async fn by_lab_test(
    State(state): State<AppState>,
    _caller: Caller,
    QueryParams(query): QueryParams<LabTestQuery>,
) -> ApiResult<Vec<MedicalRecord>> {
    listing(
        &state,
        MedicalRecordFilter {
            lab_test: Some(query.test_name),
            ..Default::default()
        },
    )
    .await
}

async fn by_patient(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(patient_id): PathParams<i64>,
) -> ApiResult<Vec<MedicalRecord>> {
    listing(
        &state,
        MedicalRecordFilter {
            patient_id: Some(patient_id),
            ..Default::default()
        },
    )
    .await
}

async fn by_patient_in_range(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(patient_id): PathParams<i64>,
    QueryParams(range): QueryParams<DateRange>,
) -> ApiResult<Vec<MedicalRecord>> {
    listing(
        &state,
        MedicalRecordFilter {
            patient_id: Some(patient_id),
            from: Some(range.start_date),
            to: Some(range.end_date),
            ..Default::default()
        },
    )
    .await
}

async fn by_patient_and_diagnosis(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(patient_id): PathParams<i64>,
    QueryParams(query): QueryParams<DiagnosisQuery>,
) -> ApiResult<Vec<MedicalRecord>> {
    listing(
        &state,
        MedicalRecordFilter {
            patient_id: Some(patient_id),
            diagnosis: Some(query.diagnosis),
            ..Default::default()
        },
    )
    .await
}

async fn latest(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(patient_id): PathParams<i64>,
    QueryParams(query): QueryParams<LatestQuery>,
) -> ApiResult<Vec<MedicalRecord>> {
    Ok(ApiResponse::ok(
        state
            .services
            .medical_records
            .latest_for_patient(patient_id, query.limit)
            .await?,
    ))
}

async fn count_by_patient(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(patient_id): PathParams<i64>,
) -> ApiResult<u64> {
    count(
        &state,
        MedicalRecordFilter {
            patient_id: Some(patient_id),
            ..Default::default()
        },
    )
    .await
}

async fn by_doctor(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(doctor_id): PathParams<i64>,
) -> ApiResult<Vec<MedicalRecord>> {
    listing(
        &state,
        MedicalRecordFilter {
            doctor_id: Some(doctor_id),
            ..Default::default()
        },
    )
    .await
}

async fn update(
    State(state): State<AppState>,
    caller: Caller,
    PathParams(id): PathParams<NoteId>,
    JsonBody(input): JsonBody<MedicalRecordInput>,
) -> ApiResult<MedicalRecord> {
    caller.require_staff()?;
    let record = state.services.medical_records.update(&id, input).await?;
    Ok(ApiResponse::with_message(
        "Medical record updated successfully",
        record,
    ))
}

async fn remove(
    State(state): State<AppState>,
    caller: Caller,
    PathParams(id): PathParams<NoteId>,
) -> ApiResult<()> {
    caller.require_staff()?;
    state.services.medical_records.delete(&id).await?;
    Ok(ApiResponse::done("Medical record deleted successfully"))
}
