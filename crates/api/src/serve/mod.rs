//! `coldwatch serve` -- the HTTP JSON API.
//!
//! Endpoints:
//! - `POST /auth/login`               - exchange credentials for a token pair
//! - `POST /auth/refresh`             - exchange a refresh token for a new pair
//! - `GET  /health`                   - liveness (exempt from auth)
//! - `POST /telemetry`                - ingest one reading (device key auth)
//! - `GET  /incidents`                - list incidents, filterable
//! - `POST /incidents`                - open an incident manually
//! - `GET  /incidents/{id}`           - incident with assignment history
//! - `PUT  /incidents/{id}/status`    - lifecycle transition
//! - `POST /incidents/{id}/assign`    - assign a technician
//! - `GET  /devices`, `/devices/{id}`, `/devices/{id}/telemetry`
//! - `GET  /technicians`, `/stores`, `/stores/{id}`, `/stores/{id}/units`
//! - `GET  /dashboard/summary`
//! - `GET  /dashboard/alerts`       - devices currently alerting
//!
//! All responses share the `{success, data, message, error_code, timestamp}`
//! envelope and Content-Type: application/json.

mod directory;
mod error;
mod handlers;
mod incidents;
mod middleware;
mod payload;
mod state;
mod telemetry;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post, put};
use axum::{middleware as axum_middleware, Router};
use tower_http::cors::{Any, CorsLayer};

use coldwatch_auth::TokenService;
use coldwatch_storage::MemoryStore;
use coldwatch_workflow::{IncidentLifecycle, IngestionPipeline, SessionFlow};

use self::middleware::auth_middleware;
use self::state::AppState;
use crate::config::ServerConfig;

/// Maximum request body size: 256 KB. Telemetry and incident bodies are
/// small; anything larger is malformed or hostile.
const MAX_BODY_SIZE: usize = 256 * 1024;

/// Start the HTTP server on the given port.
pub(crate) async fn start_server(
    port: u16,
    config: ServerConfig,
    seed_demo: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    if seed_demo {
        crate::seed::seed_demo(store.as_ref()).await?;
        eprintln!("Seeded demo stores, devices, technicians, and users");
    }

    let tokens = Arc::new(TokenService::new(&config.tokens));
    eprintln!(
        "Rate limit: {} readings per minute per device",
        config.rate_limit
    );

    let state = Arc::new(AppState {
        sessions: SessionFlow::new(Arc::clone(&store), Arc::clone(&tokens)),
        pipeline: IngestionPipeline::new(Arc::clone(&store), config.rate_limit),
        incidents: IncidentLifecycle::new(Arc::clone(&store)),
        store,
        tokens,
    });

    // CORS: permissive for local dev; tighten for production.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handlers::handle_health))
        .route("/auth/login", post(handlers::handle_login))
        .route("/auth/refresh", post(handlers::handle_refresh))
        .route("/telemetry", post(telemetry::handle_ingest))
        .route(
            "/incidents",
            get(incidents::handle_list).post(incidents::handle_create),
        )
        .route("/incidents/{id}", get(incidents::handle_get))
        .route("/incidents/{id}/status", put(incidents::handle_set_status))
        .route("/incidents/{id}/assign", post(incidents::handle_assign))
        .route("/devices", get(directory::handle_list_devices))
        .route("/devices/{id}", get(directory::handle_get_device))
        .route(
            "/devices/{id}/telemetry",
            get(directory::handle_device_telemetry),
        )
        .route("/technicians", get(directory::handle_list_technicians))
        .route("/stores", get(directory::handle_list_stores))
        .route("/stores/{id}", get(directory::handle_get_store))
        .route("/stores/{id}/units", get(directory::handle_store_units))
        .route("/dashboard/summary", get(directory::handle_dashboard))
        .route("/dashboard/alerts", get(directory::handle_dashboard_alerts))
        .fallback(handlers::handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("coldwatch listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    eprintln!("\nServer shut down.");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        eprintln!("Warning: failed to install Ctrl+C handler; running until killed");
        std::future::pending::<()>().await;
    }
    eprintln!("\nReceived shutdown signal...");
}
