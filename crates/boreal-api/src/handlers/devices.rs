//! Device provisioning and owner-side configuration.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use boreal_core::{
    derive_factory_token, derive_factory_token_hash, verify_factory_token_hash, DetectionKind,
    NotificationChannel,
};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterQuery {
    pub fth: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterDeviceResponse {
    pub device_id: String,
    pub api_token: String,
}

#[derive(Debug, Deserialize)]
pub struct SetupRequest {
    pub notification_channels: Option<Vec<NotificationChannel>>,
    pub detection_targets: Option<Vec<DetectionKind>>,
}

#[derive(Debug, Serialize)]
pub struct DeviceSummary {
    pub device_id: String,
    pub status: boreal_core::DeviceStatus,
    pub plan_type: boreal_core::PlanType,
    pub notification_channels: Vec<NotificationChannel>,
    pub detection_targets: Vec<DetectionKind>,
    pub last_seen: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<boreal_core::Device> for DeviceSummary {
    fn from(device: boreal_core::Device) -> Self {
        Self {
            device_id: device.device_id.clone(),
            status: device.status,
            plan_type: device.plan_type,
            notification_channels: device.channels().to_vec(),
            detection_targets: device
                .detection_targets
                .as_ref()
                .map(|j| j.0.clone())
                .unwrap_or_default(),
            last_seen: device.last_seen,
        }
    }
}

/// POST /api/v1/devices/:device_id/register?fth=...
///
/// Binds a factory-fresh device to the calling account. The submitted hash
/// is checked against a server-side re-derivation, so no stored secret is
/// consulted and a bad hash touches no rows.
pub async fn register_device(
    State(state): State<AppState>,
    CurrentUser { user_id }: CurrentUser,
    Path(device_id): Path<String>,
    Query(query): Query<RegisterQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let fth = query
        .fth
        .ok_or_else(|| ApiError::Validation("Missing fth query parameter".to_string()))?;
    if fth.len() != boreal_core::defaults::FACTORY_TOKEN_HEX_LEN
        || !fth.chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(ApiError::Validation(
            "Malformed fth query parameter".to_string(),
        ));
    }

    if !verify_factory_token_hash(&device_id, &state.settings.factory_secret, &fth) {
        warn!(
            subsystem = "api",
            component = "devices",
            op = "register",
            device_id = %device_id,
            user_id = %user_id,
            "Factory token hash verification failed"
        );
        return Err(ApiError::BadRequest(
            "Factory token verification failed".to_string(),
        ));
    }

    // Store the server-side re-derivation, not client input.
    let token = derive_factory_token(&device_id, &state.settings.factory_secret);
    let hash = derive_factory_token_hash(&token);

    let device = state.db.devices.register(&device_id, &hash, user_id).await?;

    info!(
        subsystem = "api",
        component = "devices",
        op = "register",
        device_id = %device.device_id,
        user_id = %user_id,
        "Device bound to owner"
    );

    let api_token = device
        .api_token
        .ok_or_else(|| ApiError::Database(boreal_core::Error::Internal(
            "bound device missing api_token".to_string(),
        )))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterDeviceResponse {
            device_id: device.device_id,
            api_token,
        }),
    ))
}

/// PUT /api/v1/devices/:device_id/setup
///
/// Owner-only. A non-owner gets 404 rather than 403 so device ids are not
/// enumerable.
pub async fn setup_device(
    State(state): State<AppState>,
    CurrentUser { user_id }: CurrentUser,
    Path(device_id): Path<String>,
    Json(req): Json<SetupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .devices
        .find_for_owner(&device_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Device {} not found", device_id)))?;

    let device = state
        .db
        .devices
        .update_setup(&device_id, req.notification_channels, req.detection_targets)
        .await?;

    info!(
        subsystem = "api",
        component = "devices",
        op = "setup",
        device_id = %device_id,
        user_id = %user_id,
        "Device preferences updated"
    );

    Ok(Json(DeviceSummary::from(device)))
}

/// GET /api/v1/devices/:device_id
pub async fn get_device(
    State(state): State<AppState>,
    CurrentUser { user_id }: CurrentUser,
    Path(device_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let device = state
        .db
        .devices
        .find_for_owner(&device_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Device {} not found", device_id)))?;

    Ok(Json(DeviceSummary::from(device)))
}
