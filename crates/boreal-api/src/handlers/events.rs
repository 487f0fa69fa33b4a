//! Detection event ingestion: live reports, offline log replay, and the
//! device status check.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use boreal_core::{ActiveLocation, Device, DeviceStatus, DetectionKind};
use boreal_db::NewEvent;

use crate::auth::DeviceAuth;
use crate::error::ApiError;
use crate::handlers::client_ip;
use crate::state::AppState;

/// Region string of the registered placement. The trial deployment does no
/// reverse geocoding, so the regional comparison is dormant and the
/// distance threshold carries the policy alone.
const REGISTERED_REGION: &str = "";

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub detection_type: DetectionKind,
    pub confidence: f64,
    /// Client-side detection time; server time is used when omitted.
    pub detected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub event_id: i64,
    pub location_mismatch: bool,
}

#[derive(Debug, Deserialize)]
pub struct LogItem {
    pub detection_type: DetectionKind,
    pub confidence: f64,
    pub detected_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UploadLogsRequest {
    pub events: Vec<LogItem>,
}

#[derive(Debug, Serialize)]
pub struct UploadLogsResponse {
    pub inserted: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: DeviceStatus,
    pub active_location: Option<ActiveLocation>,
}

fn check_device_path(device: &Device, path_id: &str) -> Result<(), ApiError> {
    if device.device_id != path_id {
        return Err(ApiError::Forbidden(
            "Credential is bound to a different device".to_string(),
        ));
    }
    Ok(())
}

fn check_not_suspended(device: &Device) -> Result<(), ApiError> {
    if device.status == DeviceStatus::Suspended {
        return Err(ApiError::Suspended(format!(
            "Device {} is suspended",
            device.device_id
        )));
    }
    Ok(())
}

fn check_confidence(confidence: f64) -> Result<(), ApiError> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ApiError::Validation(format!(
            "Confidence {} out of range [0, 1]",
            confidence
        )));
    }
    Ok(())
}

/// POST /api/v1/devices/:device_id/event
///
/// Pipeline order is fixed: authenticate, match the path id, gate on
/// suspension, persist provisionally, evaluate mismatch, amend, commit,
/// then notify. Notification runs after the response-critical work and can
/// never fail the request.
pub async fn ingest_event(
    State(state): State<AppState>,
    DeviceAuth(device): DeviceAuth,
    Path(device_id): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<EventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_device_path(&device, &device_id)?;
    check_not_suspended(&device)?;
    check_confidence(req.confidence)?;

    let origin_ip = client_ip(&headers, Some(peer));
    let event = NewEvent {
        detected_at: req.detected_at.unwrap_or_else(Utc::now),
        detection_type: req.detection_type,
        confidence: req.confidence,
        ip_address: origin_ip.map(|ip| ip.to_string()),
    };

    let mut tx = state.db.events.begin().await?;
    let event_id = state
        .db
        .events
        .insert_provisional(&mut tx, &device_id, &event)
        .await?;

    let active = state.db.locations.active(&device_id).await?;

    let mut mismatch = false;
    let mut distance_km = None;
    let mut region = String::new();
    if let (Some(location), Some(ip)) = (&active, origin_ip) {
        match state
            .mismatch_policy
            .check(
                state.geo.as_ref(),
                location.lat,
                location.lon,
                REGISTERED_REGION,
                ip,
            )
            .await
        {
            Ok(verdict) => {
                mismatch = verdict.mismatch;
                distance_km = verdict.distance_km;
                region = verdict.region;
                let resolved_region = (!region.is_empty()).then_some(region.as_str());
                state
                    .db
                    .events
                    .amend_geolocation(&mut tx, event_id, resolved_region, distance_km, mismatch)
                    .await?;
            }
            Err(e) => {
                // Geolocation trouble degrades to no-mismatch, never to a
                // failed ingestion.
                warn!(
                    subsystem = "api",
                    component = "events",
                    op = "ingest",
                    device_id = %device_id,
                    error = %e,
                    "Mismatch evaluation failed, leaving event unflagged"
                );
            }
        }
    }

    tx.commit().await.map_err(boreal_core::Error::from)?;

    if let Err(e) = state.db.devices.touch_last_seen(&device_id).await {
        warn!(
            subsystem = "api",
            component = "events",
            op = "ingest",
            device_id = %device_id,
            error = %e,
            "Failed to refresh last_seen"
        );
    }

    info!(
        subsystem = "api",
        component = "events",
        op = "ingest",
        device_id = %device_id,
        event_id,
        detection_type = req.detection_type.label(),
        mismatch,
        distance_km,
        "Detection event stored"
    );

    // Fire-and-forget: the response never waits on alert delivery.
    let notifier = state.notifier.clone();
    let channels = device.channels().to_vec();
    let notify_device_id = device_id.clone();
    let detection_type = req.detection_type;
    let confidence = req.confidence;
    tokio::spawn(async move {
        notifier
            .notify_detection(&channels, &notify_device_id, detection_type, confidence)
            .await;
        if mismatch {
            notifier
                .notify_mismatch(&channels, &notify_device_id, distance_km, &region)
                .await;
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(EventResponse {
            event_id,
            location_mismatch: mismatch,
        }),
    ))
}

/// POST /api/v1/devices/:device_id/upload-logs
///
/// Offline replay. Timestamps are stale and the origin IP is the
/// replay-time IP, so mismatch evaluation is skipped and the flag is
/// forced false on every row.
pub async fn upload_logs(
    State(state): State<AppState>,
    DeviceAuth(device): DeviceAuth,
    Path(device_id): Path<String>,
    Json(req): Json<UploadLogsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_device_path(&device, &device_id)?;
    check_not_suspended(&device)?;

    if req.events.is_empty() {
        return Err(ApiError::Validation(
            "Log batch must not be empty".to_string(),
        ));
    }
    for item in &req.events {
        check_confidence(item.confidence)?;
    }

    let events: Vec<NewEvent> = req
        .events
        .iter()
        .map(|item| NewEvent {
            detected_at: item.detected_at,
            detection_type: item.detection_type,
            confidence: item.confidence,
            ip_address: None,
        })
        .collect();

    let inserted = state.db.events.insert_batch(&device_id, &events).await?;

    if let Err(e) = state.db.devices.touch_last_seen(&device_id).await {
        warn!(
            subsystem = "api",
            component = "events",
            op = "upload_logs",
            device_id = %device_id,
            error = %e,
            "Failed to refresh last_seen"
        );
    }

    info!(
        subsystem = "api",
        component = "events",
        op = "upload_logs",
        device_id = %device_id,
        inserted,
        "Offline logs replayed"
    );

    Ok((StatusCode::CREATED, Json(UploadLogsResponse { inserted })))
}

/// GET /api/v1/devices/:device_id/status
///
/// Available while suspended, so a reconnecting device can learn it has
/// been blocked rather than concluding its credential is bad.
pub async fn device_status(
    State(state): State<AppState>,
    DeviceAuth(device): DeviceAuth,
    Path(device_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    check_device_path(&device, &device_id)?;

    let active = state.db.locations.active(&device_id).await?;

    if let Err(e) = state.db.devices.touch_last_seen(&device_id).await {
        warn!(
            subsystem = "api",
            component = "events",
            op = "status",
            device_id = %device_id,
            error = %e,
            "Failed to refresh last_seen"
        );
    }

    Ok(Json(StatusResponse {
        status: device.status,
        active_location: active.as_ref().map(ActiveLocation::from),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_bounds() {
        assert!(check_confidence(0.0).is_ok());
        assert!(check_confidence(1.0).is_ok());
        assert!(check_confidence(-0.01).is_err());
        assert!(check_confidence(1.01).is_err());
    }
}
