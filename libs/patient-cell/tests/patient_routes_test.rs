use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::router::patient_routes;
use shared_utils::test_utils::{bearer, signed_in, MockBackendResponses, TestConfig, TestUser};
use shared_utils::Session;

use std::sync::Arc;

async fn setup(server: &MockServer, user: TestUser) -> (Router, Arc<Session>) {
    let state = TestConfig::with_backend(&server.uri()).to_state();
    let session = signed_in(&state, &user).await;
    (patient_routes(state), session)
}

async fn send(app: Router, method: &str, uri: &str, session: &Session, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", bearer(session))
        .header("content-type", "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_find_doctors_filters_locally() {
    let server = MockServer::start().await;
    let (app, session) = setup(&server, TestUser::patient("pat")).await;

    Mock::given(method("GET"))
        .and(path("/api/patients/doctors/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockBackendResponses::doctor_listing(1, "an.nguyen", "Cardiology", "Ha Noi"),
            MockBackendResponses::doctor_listing(2, "binh.tran", "Pediatrics", "Ho Chi Minh City"),
            MockBackendResponses::doctor_listing(3, "chi.le", "Cardiology", "Da Nang"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(app, "GET", "/doctors?specialty=cardiology&location=ha%20noi", &session, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["doctors"][0]["username"], "an.nguyen");
}

#[tokio::test]
async fn test_medical_records_status_filter() {
    let server = MockServer::start().await;
    let (app, session) = setup(&server, TestUser::patient("pat")).await;

    Mock::given(method("GET"))
        .and(path("/api/patients/medical-records/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockBackendResponses::medical_record(1, "Seasonal flu", "Dr. An", "completed"),
            MockBackendResponses::medical_record(2, "Migraine", "Dr. Binh", "pending"),
        ])))
        .mount(&server)
        .await;

    let (status, body) = send(app, "GET", "/medical-records?status=pending", &session, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["records"][0]["diagnosis"], "Migraine");
}

#[tokio::test]
async fn test_dashboard_is_passed_through() {
    let server = MockServer::start().await;
    let (app, session) = setup(&server, TestUser::patient("pat")).await;
    let dashboard = json!({"upcoming_appointments": 2, "records": 5});

    Mock::given(method("GET"))
        .and(path("/api/patients/dashboard/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard.clone()))
        .mount(&server)
        .await;

    let (status, body) = send(app, "GET", "/dashboard", &session, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, dashboard);
}

#[tokio::test]
async fn test_update_profile_updates_session_name() {
    let server = MockServer::start().await;
    let (app, session) = setup(&server, TestUser::patient("pat")).await;

    Mock::given(method("PUT"))
        .and(path("/api/patients/profile/"))
        .and(body_partial_json(json!({"insurance_number": "INS-123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fullname": "Le Van C",
            "address": "Hue",
            "date_of_birth": "1990-04-12",
            "insurance_number": "INS-123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        app,
        "PUT",
        "/profile",
        &session,
        Some(json!({
            "fullname": "Le Van C",
            "address": "Hue",
            "date_of_birth": "1990-04-12",
            "insurance_number": "INS-123"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["date_of_birth"], "1990-04-12");
    assert_eq!(session.user().await.fullname.as_deref(), Some("Le Van C"));
}

#[tokio::test]
async fn test_future_birth_date_rejected_locally() {
    let server = MockServer::start().await;
    let (app, session) = setup(&server, TestUser::patient("pat")).await;

    Mock::given(method("PUT"))
        .and(path("/api/patients/profile/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(app, "PUT", "/profile", &session, Some(json!({"date_of_birth": "2999-01-01"}))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Date of birth cannot be in the future");
}

#[tokio::test]
async fn test_doctor_sessions_are_refused() {
    let server = MockServer::start().await;
    let (app, session) = setup(&server, TestUser::doctor("doc")).await;

    let (status, _) = send(app, "GET", "/dashboard", &session, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
