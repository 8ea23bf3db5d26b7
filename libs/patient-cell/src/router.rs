use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_utils::extractor::session_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn patient_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/profile", get(handlers::get_profile).put(handlers::update_profile))
        .route("/doctors", get(handlers::find_doctors))
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/medical-records", get(handlers::medical_records))
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware))
        .with_state(state)
}
