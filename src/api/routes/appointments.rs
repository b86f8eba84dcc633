//! `/api/appointments`

use crate::adapters::database::AppointmentFilter;
use crate::api::extract::{Caller, DateRange, JsonBody, PathParams, QueryParams};
use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use crate::domain::{
    Appointment, AppointmentId, AppointmentStatus, AppointmentUpdate, ClinicError,
    DoctorAppointmentStats, NewAppointment, Result, Role, UserId,
};
use axum::extract::State;
use axum::routing::{get, patch};
use axum::Router;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: AppointmentStatus,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/date-range", get(in_range))
        .route("/status/:status", get(by_status))
        .route("/patient/:patient_id", get(by_patient))
        .route("/patient/:patient_id/status/:status", get(by_patient_and_status))
        .route("/doctor/:doctor_id", get(by_doctor))
        .route("/doctor/:doctor_id/date-range", get(by_doctor_in_range))
        .route("/doctor/:doctor_id/scheduled/count", get(scheduled_count))
        .route("/doctor/:doctor_id/stats", get(stats))
        .route("/:id/status", patch(update_status))
        .route("/:id", get(get_one).put(update).delete(remove))
}

/// Staff act on any appointment; a patient only on their own
fn require_participant(caller: &Caller, patient_id: UserId) -> Result<()> {
    if caller.role == Role::Patient && caller.id != patient_id {
        return Err(ClinicError::Forbidden(
            "Patients may only manage their own appointments".to_string(),
        ));
    }
    Ok(())
}

async fn listing(state: &AppState, filter: AppointmentFilter) -> ApiResult<Vec<Appointment>> {
    Ok(ApiResponse::ok(
        state.services.appointments.list(&filter).await?,
    ))
}

async fn list(State(state): State<AppState>, _caller: Caller) -> ApiResult<Vec<Appointment>> {
    listing(&state, AppointmentFilter::default()).await
}

async fn create(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(candidate): JsonBody<NewAppointment>,
) -> ApiResult<Appointment> {
    require_participant(&caller, candidate.patient_id)?;
    let appointment = state.services.appointments.create(candidate).await?;
    Ok(ApiResponse::with_message(
        "Appointment booked successfully",
        appointment,
    ))
}

async fn get_one(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(id): PathParams<AppointmentId>,
) -> ApiResult<Appointment> {
    Ok(ApiResponse::ok(state.services.appointments.get(id).await?))
}

async fn in_range(
    State(state): State<AppState>,
    _caller: Caller,
    QueryParams(range): QueryParams<DateRange>,
) -> ApiResult<Vec<Appointment>> {
    listing(
        &state,
        AppointmentFilter {
            from: Some(range.start_date),
            to: Some(range.end_date),
            ..Default::default()
        },
    )
    .await
}

async fn by_status(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(status): PathParams<AppointmentStatus>,
) -> ApiResult<Vec<Appointment>> {
    listing(
        &state,
        AppointmentFilter {
            status: Some(status),
            ..Default::default()
        },
    )
    .await
}

async fn by_patient(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(patient_id): PathParams<UserId>,
) -> ApiResult<Vec<Appointment>> {
    listing(
        &state,
        AppointmentFilter {
            patient_id: Some(patient_id),
            ..Default::default()
        },
    )
    .await
}

async fn by_patient_and_status(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams((patient_id, status)): PathParams<(UserId, AppointmentStatus)>,
) -> ApiResult<Vec<Appointment>> {
    listing(
        &state,
        AppointmentFilter {
            patient_id: Some(patient_id),
            status: Some(status),
            ..Default::default()
        },
    )
    .await
}

async fn by_doctor(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(doctor_id): PathParams<UserId>,
) -> ApiResult<Vec<Appointment>> {
    listing(
        &state,
        AppointmentFilter {
            doctor_id: Some(doctor_id),
            ..Default::default()
        },
    )
    .await
}

async fn by_doctor_in_range(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(doctor_id): PathParams<UserId>,
    QueryParams(range): QueryParams<DateRange>,
) -> ApiResult<Vec<Appointment>> {
    listing(
        &state,
        AppointmentFilter {
            doctor_id: Some(doctor_id),
            from: Some(range.start_date),
            to: Some(range.end_date),
            ..Default::default()
        },
    )
    .await
}

async fn scheduled_count(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(doctor_id): PathParams<UserId>,
) -> ApiResult<u64> {
    Ok(ApiResponse::ok(
        state.services.appointments.count_scheduled(doctor_id).await?,
    ))
}

async fn stats(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(doctor_id): PathParams<UserId>,
) -> ApiResult<DoctorAppointmentStats> {
    Ok(ApiResponse::ok(
        state.services.appointments.doctor_stats(doctor_id).await?,
    ))
}

async fn update(
    State(state): State<AppState>,
    caller: Caller,
    PathParams(id): PathParams<AppointmentId>,
    JsonBody(update): JsonBody<AppointmentUpdate>,
) -> ApiResult<Appointment> {
    let appointments = &state.services.appointments;
    let current = appointments.get(id).await?;
    require_participant(&caller, current.patient_id)?;
    // Status changes are staff only, whichever route carries them
    if update.status != current.status {
        caller.require_staff()?;
    }
    let appointment = appointments.update(id, update).await?;
    Ok(ApiResponse::with_message(
        "Appointment updated successfully",
        appointment,
    ))
}

async fn update_status(
    State(state): State<AppState>,
    caller: Caller,
    PathParams(id): PathParams<AppointmentId>,
    QueryParams(query): QueryParams<StatusQuery>,
) -> ApiResult<Appointment> {
    caller.require_staff()?;
    let appointment = state
        .services
        .appointments
        .update_status(id, query.status)
        .await?;
    Ok(ApiResponse::with_message(
        "Appointment status updated successfully",
        appointment,
    ))
}

async fn remove(
    State(state): State<AppState>,
    caller: Caller,
    PathParams(id): PathParams<AppointmentId>,
) -> ApiResult<()> {
    let appointments = &state.services.appointments;
    require_participant(&caller, appointments.get(id).await?.patient_id)?;
    appointments.delete(id).await?;
    Ok(ApiResponse::done("Appointment deleted successfully"))
}
