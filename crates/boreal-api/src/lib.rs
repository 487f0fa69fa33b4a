//! # boreal-api
//!
//! HTTP API server for the boreal device platform: account auth, device
//! provisioning, placement registration, and detection event ingestion.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;

pub use error::ApiError;
pub use state::AppState;

/// Build the application router. Middleware layers are attached by the
/// binary so tests can exercise the bare routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Liveness
        .route("/health", get(handlers::health::health_check))
        // Accounts
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/refresh", post(handlers::auth::refresh))
        // Provisioning and owner configuration
        .route(
            "/api/v1/devices/:device_id/register",
            post(handlers::devices::register_device),
        )
        .route(
            "/api/v1/devices/:device_id/setup",
            put(handlers::devices::setup_device),
        )
        .route(
            "/api/v1/devices/:device_id",
            get(handlers::devices::get_device),
        )
        // Placement
        .route(
            "/api/v1/devices/:device_id/location",
            post(handlers::locations::register_location),
        )
        .route(
            "/api/v1/devices/:device_id/relocate",
            post(handlers::locations::relocate),
        )
        // Device uplink
        .route(
            "/api/v1/devices/:device_id/event",
            post(handlers::events::ingest_event),
        )
        .route(
            "/api/v1/devices/:device_id/upload-logs",
            post(handlers::events::upload_logs),
        )
        .route(
            "/api/v1/devices/:device_id/status",
            get(handlers::events::device_status),
        )
        .with_state(state)
}
