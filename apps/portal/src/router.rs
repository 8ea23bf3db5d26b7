use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use doctor_cell::handlers::DoctorState;
use doctor_cell::router::doctor_routes_with;
use patient_cell::router::patient_routes;
use shared_utils::AppState;

pub fn create_router(state: Arc<AppState>, doctor_state: Arc<DoctorState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic portal is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/doctors", doctor_routes_with(doctor_state))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/patients", patient_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use shared_config::AppConfig;
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState::new(AppConfig::default());
        let doctor_state = DoctorState::new(state.clone());
        create_router(state, doctor_state)
    }

    #[tokio::test]
    async fn root_reports_running() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Clinic portal is running!");
    }

    #[tokio::test]
    async fn cells_are_mounted_behind_sessions() {
        for uri in ["/auth/me", "/doctors/availability", "/appointments", "/patients/profile"] {
            let response = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }
}
