use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::session_middleware;
use shared_utils::AppState;

use crate::handlers::{self, DoctorState};

pub fn doctor_routes(state: Arc<AppState>) -> Router {
    doctor_routes_with(DoctorState::new(state))
}

pub fn doctor_routes_with(state: Arc<DoctorState>) -> Router {
    let protected_routes = Router::new()
        // Weekly availability editor
        .route(
            "/availability",
            get(handlers::get_availability).delete(handlers::discard_availability),
        )
        .route("/availability/actions", post(handlers::dispatch_action))
        .route("/availability/validate", post(handlers::validate_availability))
        .route("/availability/undo", post(handlers::undo_availability))
        .route("/availability/dismiss", post(handlers::dismiss_status))
        .route("/availability/save", post(handlers::save_availability))
        // Profile and overview pages
        .route("/profile", get(handlers::get_profile).put(handlers::update_profile))
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/agenda", get(handlers::get_agenda))
        .layer(middleware::from_fn_with_state(state.app.clone(), session_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
