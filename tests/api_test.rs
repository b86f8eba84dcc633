//! HTTP-level tests driving the router with `oneshot` over the in-memory store

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use clinic::adapters::database::create_stores;
use clinic::api::{router, AppState};
use clinic::config::parse_config;
use clinic::domain::{ClinicianProfile, NewIdentity, PatientProfile, Role, UserId};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const CONFIG: &str = r#"
[auth]
jwt_secret = "api-test-secret"
bcrypt_cost = 4
"#;

async fn state() -> (AppState, Router) {
    let config = parse_config(CONFIG).unwrap();
    let (store, notes) = create_stores(&config).await.unwrap();
    let state = AppState::new(&config, store, notes);
    let app = router(state.clone(), &config.server);
    (state, app)
}

fn identity(username: &str, role: Role) -> NewIdentity {
    NewIdentity {
        username: username.to_string(),
        email: format!("{username}@x.com"),
        password: "secret1".to_string(),
        first_name: username.to_string(),
        last_name: "Tester".to_string(),
        phone: None,
        role,
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn login(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

/// Seeds `drhouse` with a clinician profile and `alice` with a patient profile
async fn doctor_and_patient(state: &AppState) -> (UserId, UserId) {
    let services = &state.services;
    let doctor = services
        .auth
        .register(identity("drhouse", Role::Doctor))
        .await
        .unwrap();
    services
        .doctors
        .create(
            doctor.id,
            ClinicianProfile {
                specialization: "Cardiology".to_string(),
                license_number: "LIC-001".to_string(),
                years_of_experience: 5,
                qualification: None,
                consultation_fee: None,
            },
        )
        .await
        .unwrap();
    let patient = services
        .auth
        .register(identity("alice", Role::Patient))
        .await
        .unwrap();
    services
        .patients
        .create(patient.id, PatientProfile::default())
        .await
        .unwrap();
    (doctor.id, patient.id)
}

#[tokio::test]
async fn test_health() {
    let (_, app) = state().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "UP");
    assert_eq!(body["data"]["backend"], "memory");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (_, app) = state().await;
    let (status, body) = send(&app, Method::GET, "/api/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["path"], "/api/users");
}

#[tokio::test]
async fn test_register_login_validate() {
    let (_, app) = state().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "email": "alice@x.com",
            "password": "secret1",
            "first_name": "Alice",
            "last_name": "Doe",
            "role": "PATIENT"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "success");
    assert!(body["data"].get("password_hash").is_none());

    let token = login(&app, "alice").await;
    let (status, body) = send(&app, Method::POST, "/api/auth/validate", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], true);
    assert_eq!(body["data"]["role"], "patient");
}

#[tokio::test]
async fn test_validation_errors_are_listed() {
    let (_, app) = state().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": "al",
            "email": "nope",
            "password": "secret1",
            "first_name": "Al",
            "last_name": "Doe",
            "role": "patient"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
    assert_eq!(body["validationErrors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_admin_registration_requires_admin() {
    let (state, app) = state().await;

    let admin_request = json!({
        "username": "root2",
        "email": "root2@x.com",
        "password": "secret1",
        "first_name": "Root",
        "last_name": "Two",
        "role": "admin"
    });
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(admin_request.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    state
        .services
        .auth
        .register(identity("root", Role::Admin))
        .await
        .unwrap();
    let token = login(&app, "root").await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        Some(&token),
        Some(admin_request),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn test_user_listing_is_admin_only() {
    let (state, app) = state().await;
    state
        .services
        .auth
        .register(identity("alice", Role::Patient))
        .await
        .unwrap();
    state
        .services
        .auth
        .register(identity("root", Role::Admin))
        .await
        .unwrap();

    let patient = login(&app, "alice").await;
    let (status, body) = send(&app, Method::GET, "/api/users", Some(&patient), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["path"], "/api/users");

    let admin = login(&app, "root").await;
    let (status, body) = send(&app, Method::GET, "/api/users?size=1", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["content"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["total_elements"], 2);
}

#[tokio::test]
async fn test_booking_conflict_over_http() {
    let (state, app) = state().await;
    let (doctor, patient) = doctor_and_patient(&state).await;

    let token = login(&app, "alice").await;
    let at = Utc::now() + Duration::hours(2);
    let book = |offset: Duration, patient_id: UserId| {
        json!({
            "patient_id": patient_id,
            "doctor_id": doctor,
            "appointment_date": (at + offset).to_rfc3339(),
        })
    };

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/appointments",
        Some(&token),
        Some(book(Duration::zero(), patient)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "scheduled");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/appointments",
        Some(&token),
        Some(book(Duration::minutes(30), patient)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["path"], "/api/appointments");

    // A patient cannot book on someone else's behalf
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/appointments",
        Some(&token),
        Some(book(Duration::hours(3), doctor)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_status_changes_are_staff_only() {
    let (state, app) = state().await;
    let (doctor, patient) = doctor_and_patient(&state).await;
    let alice = login(&app, "alice").await;
    let house = login(&app, "drhouse").await;

    let date = (Utc::now() + Duration::hours(3)).to_rfc3339();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/appointments",
        Some(&alice),
        Some(json!({ "patient_id": patient, "doctor_id": doctor, "appointment_date": date })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let uri = format!("/api/appointments/{}", body["data"]["id"]);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("{uri}/status?status=completed"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&alice),
        Some(json!({ "appointment_date": date, "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Rescheduling without touching the status is still the patient's call
    let later = (Utc::now() + Duration::hours(6)).to_rfc3339();
    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&alice),
        Some(json!({ "appointment_date": later, "notes": "moved", "status": "scheduled" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "scheduled");

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&house),
        Some(json!({ "appointment_date": later, "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "confirmed");
}

#[tokio::test]
async fn test_malformed_input() {
    let (state, app) = state().await;
    state
        .services
        .auth
        .register(identity("alice", Role::Patient))
        .await
        .unwrap();
    let token = login(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/appointments/not-a-number",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_and_missing_entity() {
    let (state, app) = state().await;
    state
        .services
        .auth
        .register(identity("alice", Role::Patient))
        .await
        .unwrap();
    let token = login(&app, "alice").await;

    let (status, body) = send(&app, Method::GET, "/api/nothing-here", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["path"], "/api/nothing-here");

    let (status, body) = send(&app, Method::GET, "/api/doctors/42", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Doctor not found: 42");
}
