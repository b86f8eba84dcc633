//! `/api/prescriptions`

use crate::adapters::database::PrescriptionFilter;
use crate::api::extract::{
    Caller, DateRange, DiagnosisQuery, JsonBody, LatestQuery, PathParams, QueryParams,
};
use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use crate::domain::{NewPrescription, NoteId, Prescription, PrescriptionUpdate};
use axum::extract::State;
use axum::routing::{get, patch};
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/active", get(active))
        .route("/patient/:patient_id", get(by_patient))
        .route("/patient/:patient_id/date-range", get(by_patient_in_range))
        .route("/patient/:patient_id/latest", get(latest))
        .route("/patient/:patient_id/count", get(count_by_patient))
        .route("/doctor/:doctor_id", get(by_doctor))
        .route("/doctor/:doctor_id/diagnosis", get(by_doctor_and_diagnosis))
        .route("/doctor/:doctor_id/count", get(count_by_doctor))
        .route("/appointment/:appointment_id", get(by_appointment))
        .route("/:id/deactivate", patch(deactivate))
        .route("/:id", get(get_one).put(update).delete(remove))
}

async fn listing(state: &AppState, filter: PrescriptionFilter) -> ApiResult<Vec<Prescription>> {
    Ok(ApiResponse::ok(
        state.services.prescriptions.list(&filter).await?,
    ))
}

async fn list(State(state): State<AppState>, _caller: Caller) -> ApiResult<Vec<Prescription>> {
    listing(&state, PrescriptionFilter::default()).await
}

async fn create(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(input): JsonBody<NewPrescription>,
) -> ApiResult<Prescription> {
    caller.require_staff()?;
    let prescription = state.services.prescriptions.create(input).await?;
    Ok(ApiResponse::with_message(
        "Prescription created successfully",
        prescription,
    ))
}

async fn get_one(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(id): PathParams<NoteId>,
) -> ApiResult<Prescription> {
    Ok(ApiResponse::ok(state.services.prescriptions.get(&id).await?))
}

async fn active(State(state): State<AppState>, _caller: Caller) -> ApiResult<Vec<Prescription>> {
    listing(
        &state,
        PrescriptionFilter {
            active: Some(true),
            ..Default::default()
        },
    )
    .await
}

async fn by_patient(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(patient_id): PathParams<i64>,
) -> ApiResult<Vec<Prescription>> {
    listing(
        &state,
        PrescriptionFilter {
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
) -> ApiResult<Vec<Prescription>> {
    listing(
        &state,
        PrescriptionFilter {
            patient_id: Some(patient_id),
            from: Some(range.start_date),
            to: Some(range.end_date),
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
) -> ApiResult<Vec<Prescription>> {
    Ok(ApiResponse::ok(
        state
            .services
            .prescriptions
            .latest_for_patient(patient_id, query.limit)
            .await?,
    ))
}

async fn by_doctor(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(doctor_id): PathParams<i64>,
) -> ApiResult<Vec<Prescription>> {
    listing(
        &state,
        PrescriptionFilter {
            doctor_id: Some(doctor_id),
            ..Default::default()
        },
    )
    .await
}

async fn by_doctor_and_diagnosis(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(doctor_id): PathParams<i64>,
    QueryParams(query): QueryParams<DiagnosisQuery>,
) -> ApiResult<Vec<Prescription>> {
    listing(
        &state,
        PrescriptionFilter {
            doctor_id: Some(doctor_id),
            diagnosis: Some(query.diagnosis),
            ..Default::default()
        },
    )
    .await
}

async fn by_appointment(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(appointment_id): PathParams<i64>,
) -> ApiResult<Vec<Prescription>> {
    listing(
        &state,
        PrescriptionFilter {
            appointment_id: Some(appointment_id),
            ..Default::default()
        },
    )
    .await
}

async fn count_by_patient(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(patient_id): PathParams<i64>,
) -> ApiResult<u64> {
    let filter = PrescriptionFilter {
        patient_id: Some(patient_id),
        ..Default::default()
    };
    Ok(ApiResponse::ok(
        state.services.prescriptions.count(&filter).await?,
    ))
}

async fn count_by_doctor(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(doctor_id): PathParams<i64>,
) -> ApiResult<u64> {
    let filter = PrescriptionFilter {
        doctor_id: Some(doctor_id),
        ..Default::default()
    };
    Ok(ApiResponse::ok(
        state.services.prescriptions.count(&filter).await?,
    ))
}

async fn update(
    State(state): State<AppState>,
    caller: Caller,
    PathParams(id): PathParams<NoteId>,
    JsonBody(update): JsonBody<PrescriptionUpdate>,
) -> ApiResult<Prescription> {
    caller.require_staff()?;
    let prescription = state.services.prescriptions.update(&id, update).await?;
    Ok(ApiResponse::with_message(
        "Prescription updated successfully",
        prescription,
    ))
}

async fn deactivate(
    State(state): State<AppState>,
    caller: Caller,
    PathParams(id): PathParams<NoteId>,
) -> ApiResult<Prescription> {
    caller.require_staff()?;
    let prescription = state.services.prescriptions.deactivate(&id).await?;
    Ok(ApiResponse::with_message(
        "Prescription deactivated successfully",
        prescription,
    ))
}

async fn remove(
    State(state): State<AppState>,
    caller: Caller,
    PathParams(id): PathParams<NoteId>,
) -> ApiResult<()> {
    caller.require_staff()?;
    state.services.prescriptions.delete(&id).await?;
    Ok(ApiResponse::done("Prescription deleted successfully"))
}
