//! `/api/doctors`

use crate::adapters::database::DoctorFilter;
use crate::api::extract::{Caller, JsonBody, PathParams};
use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use crate::domain::{ClinicError, ClinicianProfile, Doctor, DoctorUpdate, Role, UserId};
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

/// Clinician profile attached to an existing identity
#[derive(Debug, Deserialize)]
pub struct CreateDoctor {
    pub user_id: UserId,
    #[serde(flatten)]
    pub profile: ClinicianProfile,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/specializations", get(specializations))
        .route("/license/:license", get(by_license))
        .route("/specialization/:specialization", get(by_specialization))
        .route(
            "/specialization/:specialization/experience/:years",
            get(by_specialization_and_experience),
        )
        .route("/experience/:years", get(by_experience))
        .route("/stats/count/:specialization", get(count_by_specialization))
        .route("/:id", get(get_one).put(update).delete(remove))
}

/// Doctors may only manage their own profile
fn require_owner_or_admin(caller: &Caller, id: UserId) -> crate::domain::Result<()> {
    caller.require_staff()?;
    if caller.role == Role::Doctor && caller.id != id {
        return Err(ClinicError::Forbidden(
            "Doctors may only manage their own profile".to_string(),
        ));
    }
    Ok(())
}

async fn list(State(state): State<AppState>, _caller: Caller) -> ApiResult<Vec<Doctor>> {
    Ok(ApiResponse::ok(
        state.services.doctors.list(&DoctorFilter::default()).await?,
    ))
}

async fn create(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(request): JsonBody<CreateDoctor>,
) -> ApiResult<Doctor> {
    require_owner_or_admin(&caller, request.user_id)?;
    let doctor = state
        .services
        .doctors
        .create(request.user_id, request.profile)
        .await?;
    Ok(ApiResponse::with_message("Doctor created successfully", doctor))
}

async fn get_one(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(id): PathParams<UserId>,
) -> ApiResult<Doctor> {
    Ok(ApiResponse::ok(state.services.doctors.get(id).await?))
}

async fn by_license(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(license): PathParams<String>,
) -> ApiResult<Doctor> {
    Ok(ApiResponse::ok(
        state.services.doctors.get_by_license(&license).await?,
    ))
}

async fn by_specialization(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(specialization): PathParams<String>,
) -> ApiResult<Vec<Doctor>> {
    let filter = DoctorFilter {
        specialization: Some(specialization),
        ..Default::default()
    };
    Ok(ApiResponse::ok(state.services.doctors.list(&filter).await?))
}

async fn by_experience(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(years): PathParams<i32>,
) -> ApiResult<Vec<Doctor>> {
    let filter = DoctorFilter {
        min_experience: Some(years),
        ..Default::default()
    };
    Ok(ApiResponse::ok(state.services.doctors.list(&filter).await?))
}

async fn by_specialization_and_experience(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams((specialization, years)): PathParams<(String, i32)>,
) -> ApiResult<Vec<Doctor>> {
    let filter = DoctorFilter {
        specialization: Some(specialization),
        min_experience: Some(years),
    };
    Ok(ApiResponse::ok(state.services.doctors.list(&filter).await?))
}

async fn specializations(State(state): State<AppState>, _caller: Caller) -> ApiResult<Vec<String>> {
    Ok(ApiResponse::ok(state.services.doctors.specializations().await?))
}

async fn count_by_specialization(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(specialization): PathParams<String>,
) -> ApiResult<u64> {
    let filter = DoctorFilter {
        specialization: Some(specialization),
        ..Default::default()
    };
    Ok(ApiResponse::ok(state.services.doctors.count(&filter).await?))
}

async fn update(
    State(state): State<AppState>,
    caller: Caller,
    PathParams(id): PathParams<UserId>,
    JsonBody(update): JsonBody<DoctorUpdate>,
) -> ApiResult<Doctor> {
    require_owner_or_admin(&caller, id)?;
    let doctor = state.services.doctors.update(id, update).await?;
    Ok(ApiResponse::with_message("Doctor updated successfully", doctor))
}

async fn remove(
    State(state): State<AppState>,
    caller: Caller,
    PathParams(id): PathParams<UserId>,
) -> ApiResult<()> {
    caller.require_admin()?;
    state.services.doctors.delete(id).await?;
    Ok(ApiResponse::done("Doctor deleted successfully"))
}
