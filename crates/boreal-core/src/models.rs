//! Core data models for the boreal platform.
//!
//! These types are shared across all boreal crates and represent the core
//! domain entities: users, field devices, placement history, and detection
//! events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

// =============================================================================
// ENUMS
// =============================================================================

/// Operational status of a device.
///
/// Suspension is a runtime toggle independent of credential validity: a
/// suspended device still authenticates, but may not ingest new events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Suspended,
}

/// Subscription plan of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PlanType {
    Consumer,
    Ultimate,
}

/// Category of a detection event. Fixed set, extensible by adding variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DetectionKind {
    Bear,
    Human,
    Vehicle,
    Unknown,
}

impl DetectionKind {
    /// Human-readable label used in notification messages.
    pub fn label(&self) -> &'static str {
        match self {
            DetectionKind::Bear => "bear",
            DetectionKind::Human => "human",
            DetectionKind::Vehicle => "vehicle",
            DetectionKind::Unknown => "unknown",
        }
    }
}

/// A notification delivery channel configured by the device owner.
///
/// Persisted as validated JSONB rather than an opaque string blob; unknown
/// channel kinds are rejected at the API boundary by serde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationChannel {
    /// LINE Notify personal access token.
    Line { token: String },
    /// Email address; accepted and stored, delivered by an external relay.
    Email { address: String },
}

// =============================================================================
// ENTITIES
// =============================================================================

/// A registered account that owns zero or more devices.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A field-deployed detection device.
///
/// Invariant: `api_token` is non-null iff `owner_user_id` is non-null (the
/// token is issued exactly at the owner-bind transition).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Device {
    /// Opaque identifier assigned once at manufacture, never reused.
    pub device_id: String,
    pub owner_user_id: Option<Uuid>,
    /// Public commitment to the factory token; the raw token is never stored.
    pub factory_token_hash: String,
    /// Bearer credential for device→server traffic, issued at binding.
    pub api_token: Option<String>,
    pub status: DeviceStatus,
    pub plan_type: PlanType,
    pub notification_channels: Option<Json<Vec<NotificationChannel>>>,
    pub detection_targets: Option<Json<Vec<DetectionKind>>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Device {
    /// Whether the device has been bound to an owner.
    pub fn is_bound(&self) -> bool {
        self.owner_user_id.is_some()
    }

    /// Notification channels, empty when the owner configured none.
    pub fn channels(&self) -> &[NotificationChannel] {
        self.notification_channels
            .as_ref()
            .map(|j| j.0.as_slice())
            .unwrap_or(&[])
    }
}

/// One row of the append-only placement history.
///
/// Exactly one row per device carries `active = true`; superseded rows are
/// flipped inactive, never edited or deleted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LocationHistory {
    pub id: i64,
    pub device_id: String,
    pub lat: f64,
    pub lon: f64,
    pub accuracy_m: Option<f64>,
    pub registered_by: Uuid,
    pub active: bool,
    pub ip_address: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// A single ingested detection report.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DetectionEvent {
    pub id: i64,
    pub device_id: String,
    pub detected_at: DateTime<Utc>,
    pub detection_type: DetectionKind,
    /// AI confidence score in [0, 1].
    pub confidence: f64,
    /// Origin IP observed at ingestion time.
    pub ip_address: Option<String>,
    /// Region the origin IP resolved to, when geolocation succeeded.
    pub ip_geolocation_region: Option<String>,
    /// Great-circle distance from the active placement, in kilometers.
    pub distance_from_registered_km: Option<f64>,
    pub location_mismatch: bool,
}

/// Snapshot of the device's current placement, as returned by the status
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveLocation {
    pub lat: f64,
    pub lon: f64,
    pub accuracy_m: Option<f64>,
    pub registered_at: DateTime<Utc>,
}

impl From<&LocationHistory> for ActiveLocation {
    fn from(row: &LocationHistory) -> Self {
        Self {
            lat: row.lat,
            lon: row.lon,
            accuracy_m: row.accuracy_m,
            registered_at: row.registered_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_kind_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&DetectionKind::Bear).unwrap(),
            "\"bear\""
        );
        let parsed: DetectionKind = serde_json::from_str("\"vehicle\"").unwrap();
        assert_eq!(parsed, DetectionKind::Vehicle);
    }

    #[test]
    fn test_detection_kind_rejects_unknown_value() {
        let parsed = serde_json::from_str::<DetectionKind>("\"drone\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_notification_channel_tagged_serde() {
        let channel = NotificationChannel::Line {
            token: "tok".to_string(),
        };
        let json = serde_json::to_value(&channel).unwrap();
        assert_eq!(json["kind"], "line");
        assert_eq!(json["token"], "tok");

        let email: NotificationChannel =
            serde_json::from_value(serde_json::json!({"kind": "email", "address": "a@b.jp"}))
                .unwrap();
        assert_eq!(
            email,
            NotificationChannel::Email {
                address: "a@b.jp".to_string()
            }
        );
    }

    #[test]
    fn test_notification_channel_rejects_unknown_kind() {
        let parsed = serde_json::from_value::<NotificationChannel>(
            serde_json::json!({"kind": "pager", "number": "123"}),
        );
        assert!(parsed.is_err());
    }
}
