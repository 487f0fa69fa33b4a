//! Placement registration and relocation.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{verify_password, CurrentUser};
use crate::error::ApiError;
use crate::handlers::client_ip;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub lat: f64,
    pub lon: f64,
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RelocateRequest {
    pub lat: f64,
    pub lon: f64,
    pub accuracy_m: Option<f64>,
    /// Owner password, re-verified before any write.
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub location_id: i64,
    pub warning: Option<String>,
}

fn validate_coordinates(lat: f64, lon: f64, accuracy_m: Option<f64>) -> Result<(), ApiError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ApiError::Validation(format!(
            "Latitude {} out of range [-90, 90]",
            lat
        )));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(ApiError::Validation(format!(
            "Longitude {} out of range [-180, 180]",
            lon
        )));
    }
    if let Some(acc) = accuracy_m {
        if acc < 0.0 {
            return Err(ApiError::Validation(
                "Accuracy must be non-negative".to_string(),
            ));
        }
    }
    Ok(())
}

async fn write_location(
    state: &AppState,
    device_id: &str,
    user_id: uuid::Uuid,
    lat: f64,
    lon: f64,
    accuracy_m: Option<f64>,
    ip: Option<String>,
) -> Result<LocationResponse, ApiError> {
    state
        .db
        .devices
        .find_for_owner(device_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Device {} not found", device_id)))?;

    let (row, warning) = state
        .db
        .locations
        .register(device_id, lat, lon, accuracy_m, user_id, ip.as_deref())
        .await?;

    info!(
        subsystem = "api",
        component = "locations",
        op = "register",
        device_id,
        location_id = row.id,
        accuracy_m,
        "Placement registered"
    );

    Ok(LocationResponse {
        location_id: row.id,
        warning,
    })
}

/// POST /api/v1/devices/:device_id/location
pub async fn register_location(
    State(state): State<AppState>,
    CurrentUser { user_id }: CurrentUser,
    Path(device_id): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<LocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_coordinates(req.lat, req.lon, req.accuracy_m)?;
    let ip = client_ip(&headers, Some(peer)).map(|ip| ip.to_string());

    let response = write_location(
        &state,
        &device_id,
        user_id,
        req.lat,
        req.lon,
        req.accuracy_m,
        ip,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/devices/:device_id/relocate
///
/// Identical write path, but the owner must re-submit their password first.
/// Moving a bound device is the one owner action that can silently defeat
/// mismatch detection, so it gets the extra gate.
pub async fn relocate(
    State(state): State<AppState>,
    CurrentUser { user_id }: CurrentUser,
    Path(device_id): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<RelocateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_coordinates(req.lat, req.lon, req.accuracy_m)?;

    let user = state
        .db
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown account".to_string()))?;
    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized(
            "Password verification failed".to_string(),
        ));
    }

    let ip = client_ip(&headers, Some(peer)).map(|ip| ip.to_string());
    let response = write_location(
        &state,
        &device_id,
        user_id,
        req.lat,
        req.lon,
        req.accuracy_m,
        ip,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}
