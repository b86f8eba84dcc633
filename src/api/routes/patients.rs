//! `/api/patients`

use crate::api::extract::{Caller, JsonBody, PathParams, QueryParams};
use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use crate::domain::{ClinicError, Patient, PatientProfile, PatientUpdate, Result, Role, UserId};
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

/// Patient profile attached to an existing identity
#[derive(Debug, Deserialize)]
pub struct CreatePatient {
    pub user_id: UserId,
    #[serde(flatten)]
    pub profile: PatientProfile,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LastNameQuery {
    #[serde(alias = "lastName")]
    pub last_name: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/email/:email", get(by_email))
        .route("/search/name", get(search))
        .route("/search/lastname", get(search_by_last_name))
        .route("/stats/count", get(count))
        .route("/emergency-contacts", get(with_emergency_contact))
        .route("/:id", get(get_one).put(update).delete(remove))
}

/// Staff manage any patient; a patient only their own record
fn require_self_or_staff(caller: &Caller, id: UserId) -> Result<()> {
    match caller.role {
        Role::Admin | Role::Doctor => Ok(()),
        Role::Patient if caller.id == id => Ok(()),
        Role::Patient => Err(ClinicError::Forbidden(
            "Patients may only manage their own record".to_string(),
        )),
    }
}

async fn list(State(state): State<AppState>, _caller: Caller) -> ApiResult<Vec<Patient>> {
    Ok(ApiResponse::ok(state.services.patients.list().await?))
}

async fn create(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(request): JsonBody<CreatePatient>,
) -> ApiResult<Patient> {
    require_self_or_staff(&caller, request.user_id)?;
    let patient = state
        .services
        .patients
        .create(request.user_id, request.profile)
        .await?;
    Ok(ApiResponse::with_message("Patient created successfully", patient))
}

async fn get_one(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(id): PathParams<UserId>,
) -> ApiResult<Patient> {
    Ok(ApiResponse::ok(state.services.patients.get(id).await?))
}

async fn by_email(
    State(state): State<AppState>,
    _caller: Caller,
    PathParams(email): PathParams<String>,
) -> ApiResult<Patient> {
    Ok(ApiResponse::ok(
        state.services.patients.get_by_email(&email).await?,
    ))
}

async fn search(
    State(state): State<AppState>,
    _caller: Caller,
    QueryParams(query): QueryParams<NameQuery>,
) -> ApiResult<Vec<Patient>> {
    Ok(ApiResponse::ok(
        state.services.patients.search(&query.name).await?,
    ))
}

async fn search_by_last_name(
    State(state): State<AppState>,
    _caller: Caller,
    QueryParams(query): QueryParams<LastNameQuery>,
) -> ApiResult<Vec<Patient>> {
    Ok(ApiResponse::ok(
        state
            .services
            .patients
            .search_by_last_name(&query.last_name)
            .await?,
    ))
}

async fn count(State(state): State<AppState>, _caller: Caller) -> ApiResult<u64> {
    Ok(ApiResponse::ok(state.services.patients.count().await?))
}

async fn with_emergency_contact(
    State(state): State<AppState>,
    _caller: Caller,
) -> ApiResult<Vec<Patient>> {
    Ok(ApiResponse::ok(
        state.services.patients.with_emergency_contact().await?,
    ))
}

async fn update(
    State(state): State<AppState>,
    caller: Caller,
    PathParams(id): PathParams<UserId>,
    JsonBody(update): JsonBody<PatientUpdate>,
) -> ApiResult<Patient> {
    require_self_or_staff(&caller, id)?;
    let patient = state.services.patients.update(id, update).await?;
    Ok(ApiResponse::with_message("Patient updated successfully", patient))
}

async fn remove(
    State(state): State<AppState>,
    caller: Caller,
    PathParams(id): PathParams<UserId>,
) -> ApiResult<()> {
    caller.require_admin()?;
    state.services.patients.delete(id).await?;
    Ok(ApiResponse::done("Patient deleted successfully"))
}
