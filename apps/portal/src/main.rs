use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use doctor_cell::handlers::DoctorState;
use shared_config::AppConfig;
use shared_utils::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic portal");

    let config = AppConfig::from_env();
    info!("Backend API at {}", config.api_url);
    let port = config.port;

    // Create shared state
    let state = AppState::new(config);
    let doctor_state = DoctorState::new(state.clone());

    spawn_session_sweeper(doctor_state.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(state, doctor_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Drops idle sessions and the availability editors they owned.
fn spawn_session_sweeper(doctor_state: std::sync::Arc<DoctorState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;

            let sessions = &doctor_state.app.sessions;
            let purged = sessions.purge_expired().await;
            let dropped = doctor_state.editors.retain_live(sessions).await;

            if purged > 0 || dropped > 0 {
                info!(
                    "Session sweep: {} expired, {} editors dropped, {} active",
                    purged,
                    dropped,
                    sessions.len().await
                );
            }
        }
    });
}
