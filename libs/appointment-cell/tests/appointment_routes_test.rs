use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_utils::test_utils::{bearer, signed_in, MockBackendResponses, TestConfig, TestUser};
use shared_utils::{AppState, Session};

async fn setup(server: &MockServer, user: TestUser) -> (Router, Arc<AppState>, Arc<Session>) {
    let state = TestConfig::with_backend(&server.uri()).to_state();
    let session = signed_in(&state, &user).await;
    (appointment_routes(state.clone()), state, session)
}

fn call(method: &str, uri: &str, session: &Session, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", bearer(session))
        .header("content-type", "application/json");

    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn future_slot(days: i64) -> String {
    (Utc::now() + Duration::days(days)).to_rfc3339()
}

#[tokio::test]
async fn test_requests_without_session_are_rejected() {
    let server = MockServer::start().await;
    let (app, _, _) = setup(&server, TestUser::patient("pat")).await;

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_book_appointment_success() {
    let server = MockServer::start().await;
    let (app, _, session) = setup(&server, TestUser::patient("pat")).await;
    let slot = future_slot(2);

    Mock::given(method("POST"))
        .and(path("/api/patients/booking/"))
        .and(body_partial_json(json!({"doctor": 21, "reason": "Back pain"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(MockBackendResponses::appointment(7, "pending", &slot)))
        .expect(1)
        .mount(&server)
        .await;

    let response = app
        .oneshot(call(
            "POST",
            "/book",
            &session,
            Some(json!({"doctor": 21, "timeslot": slot, "reason": "Back pain"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["appointment"]["id"], 7);
    assert_eq!(body["appointment"]["status"], "pending");
}

#[tokio::test]
async fn test_book_appointment_in_the_past_never_reaches_backend() {
    let server = MockServer::start().await;
    let (app, _, session) = setup(&server, TestUser::patient("pat")).await;

    Mock::given(method("POST"))
        .and(path("/api/patients/booking/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let response = app
        .oneshot(call(
            "POST",
            "/book",
            &session,
            Some(json!({"doctor": 21, "timeslot": future_slot(-1), "reason": "Back pain"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_doctor_cannot_book() {
    let server = MockServer::start().await;
    let (app, _, session) = setup(&server, TestUser::doctor("doc")).await;

    let response = app
        .oneshot(call(
            "POST",
            "/book",
            &session,
            Some(json!({"doctor": 21, "timeslot": future_slot(1), "reason": "x"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_appointments_forwards_status_filter() {
    let server = MockServer::start().await;
    let (app, _, session) = setup(&server, TestUser::patient("pat")).await;

    Mock::given(method("GET"))
        .and(path("/api/patients/appointments/"))
        .and(query_param("status", "confirmed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockBackendResponses::appointment(1, "confirmed", &future_slot(1)),
            MockBackendResponses::appointment(2, "confirmed", &future_slot(3)),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = app
        .oneshot(call("GET", "/?status=confirmed", &session, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["total"], 2);
}

#[tokio::test]
async fn test_grouped_appointments() {
    let server = MockServer::start().await;
    let (app, _, session) = setup(&server, TestUser::patient("pat")).await;

    Mock::given(method("GET"))
        .and(path("/api/patients/appointments/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockBackendResponses::appointment(1, "confirmed", &future_slot(1)),
            MockBackendResponses::appointment(2, "pending", &future_slot(-4)),
            MockBackendResponses::appointment(3, "cancelled", &future_slot(2)),
        ])))
        .mount(&server)
        .await;

    let response = app.oneshot(call("GET", "/grouped", &session, None)).await.unwrap();
    let body = json_body(response).await;

    assert_eq!(body["upcoming"][0]["id"], 1);
    assert_eq!(body["past"][0]["id"], 2);
    assert_eq!(body["cancelled"][0]["id"], 3);
}

#[tokio::test]
async fn test_update_cancelled_appointment_is_conflict() {
    let server = MockServer::start().await;
    let (app, _, session) = setup(&server, TestUser::patient("pat")).await;

    Mock::given(method("GET"))
        .and(path("/api/patients/appointments/5/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockBackendResponses::appointment(5, "cancelled", &future_slot(2))),
        )
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/patients/appointments/5/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let response = app
        .oneshot(call("PUT", "/5", &session, Some(json!({"reason": "New reason"}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_patient_cancel_sends_cancelled_status() {
    let server = MockServer::start().await;
    let (app, _, session) = setup(&server, TestUser::patient("pat")).await;
    let slot = future_slot(2);

    Mock::given(method("GET"))
        .and(path("/api/patients/appointments/5/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::appointment(5, "confirmed", &slot)))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/patients/appointments/5/"))
        .and(body_partial_json(json!({"status": "cancelled"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::appointment(5, "cancelled", &slot)))
        .expect(1)
        .mount(&server)
        .await;

    let response = app.oneshot(call("POST", "/5/cancel", &session, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["appointment"]["status"], "cancelled");
}

#[tokio::test]
async fn test_missing_appointment_is_not_found() {
    let server = MockServer::start().await;
    let (app, _, session) = setup(&server, TestUser::patient("pat")).await;

    Mock::given(method("GET"))
        .and(path("/api/patients/appointments/99/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(MockBackendResponses::error_response("Not found.")))
        .mount(&server)
        .await;

    let response = app.oneshot(call("GET", "/99", &session, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_doctor_confirms_pending_appointment() {
    let server = MockServer::start().await;
    let (app, _, session) = setup(&server, TestUser::doctor("doc")).await;
    let slot = future_slot(1);

    Mock::given(method("GET"))
        .and(path("/api/doctors/appointments/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockBackendResponses::appointment(
            4, "pending", &slot
        )])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/doctors/appointments/4/confirm/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Appointment confirmed"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = app.oneshot(call("POST", "/4/confirm", &session, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "confirmed");
}

#[tokio::test]
async fn test_doctor_cannot_cancel_confirmed_appointment() {
    let server = MockServer::start().await;
    let (app, _, session) = setup(&server, TestUser::doctor("doc")).await;

    Mock::given(method("GET"))
        .and(path("/api/doctors/appointments/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockBackendResponses::appointment(
            4,
            "confirmed",
            &future_slot(1)
        )])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/doctors/appointments/4/cancel/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let response = app
        .oneshot(call("POST", "/doctor/4/cancel", &session, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}
