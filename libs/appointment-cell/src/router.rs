use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::session_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    // Every appointment operation needs a signed-in session
    let protected_routes = Router::new()
        // Patient side
        .route("/", get(handlers::list_appointments))
        .route("/book", post(handlers::book_appointment))
        .route("/grouped", get(handlers::grouped_appointments))
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment).put(handlers::update_appointment),
        )
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        // Doctor side
        .route("/doctor", get(handlers::doctor_appointments))
        .route("/{appointment_id}/confirm", post(handlers::confirm_appointment))
        .route("/doctor/{appointment_id}/cancel", post(handlers::doctor_cancel_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
