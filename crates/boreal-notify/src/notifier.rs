//! Notification dispatch.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use boreal_core::defaults::{LINE_NOTIFY_URL, NOTIFY_TIMEOUT_SECS};
use boreal_core::{DetectionKind, NotificationChannel};

use crate::message::{detection_message, mismatch_message};

/// Dispatches owner alerts. Implementations are infallible at the interface:
/// delivery failures are their own problem (logged), never the caller's.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notify the owner of a detection event.
    async fn notify_detection(
        &self,
        channels: &[NotificationChannel],
        device_id: &str,
        kind: DetectionKind,
        confidence: f64,
    );

    /// Notify the owner of a location-mismatch alert.
    async fn notify_mismatch(
        &self,
        channels: &[NotificationChannel],
        device_id: &str,
        distance_km: Option<f64>,
        region: &str,
    );
}

/// Optional secondary event-report sink.
///
/// Transitional: mirrors detection alerts to a second endpoint during the
/// platform migration. Configured independently and disabled unless a URL is
/// set.
#[derive(Debug, Clone)]
pub struct SecondaryReport {
    pub url: String,
    pub token: Option<String>,
}

/// HTTP notifier: LINE Notify per owner channel, plus the optional secondary
/// report sink.
pub struct HttpNotifier {
    client: Client,
    line_notify_url: String,
    secondary: Option<SecondaryReport>,
}

impl HttpNotifier {
    /// Create a notifier for the given LINE Notify endpoint.
    pub fn new(line_notify_url: String, secondary: Option<SecondaryReport>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(NOTIFY_TIMEOUT_SECS))
            .build()
            .expect("failed to build notification HTTP client");
        Self {
            client,
            line_notify_url,
            secondary,
        }
    }

    /// Create against the public LINE Notify endpoint, no secondary sink.
    pub fn default_endpoints() -> Self {
        Self::new(LINE_NOTIFY_URL.to_string(), None)
    }

    async fn send_line(&self, token: &str, message: &str) {
        let result = self
            .client
            .post(&self.line_notify_url)
            .bearer_auth(token)
            .form(&[("message", message)])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                warn!(
                    subsystem = "notify",
                    component = "line",
                    op = "send",
                    status = %response.status(),
                    "LINE Notify delivery rejected"
                );
            }
            Err(e) => {
                warn!(
                    subsystem = "notify",
                    component = "line",
                    op = "send",
                    error = %e,
                    "LINE Notify delivery failed"
                );
            }
        }
    }

    /// Fan a message out to every configured channel, best-effort.
    async fn deliver(&self, channels: &[NotificationChannel], device_id: &str, message: &str) {
        if channels.is_empty() {
            debug!(
                subsystem = "notify",
                component = "dispatcher",
                op = "deliver",
                device_id,
                "No notification channels configured, skipping"
            );
            return;
        }

        for channel in channels {
            match channel {
                NotificationChannel::Line { token } => self.send_line(token, message).await,
                NotificationChannel::Email { address } => {
                    // Mail relay integration lives outside this service.
                    debug!(
                        subsystem = "notify",
                        component = "dispatcher",
                        op = "deliver",
                        device_id,
                        address,
                        "Email channel handled by external relay, skipping"
                    );
                }
            }
        }
    }

    async fn report_secondary(&self, device_id: &str, kind: DetectionKind, confidence: f64) {
        let Some(secondary) = &self.secondary else {
            return;
        };

        let mut request = self.client.post(&secondary.url).json(&serde_json::json!({
            "device_id": device_id,
            "detection_type": kind,
            "confidence": confidence,
        }));
        if let Some(token) = &secondary.token {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                warn!(
                    subsystem = "notify",
                    component = "secondary",
                    op = "send",
                    device_id,
                    status = %response.status(),
                    "Secondary report rejected"
                );
            }
            Err(e) => {
                warn!(
                    subsystem = "notify",
                    component = "secondary",
                    op = "send",
                    device_id,
                    error = %e,
                    "Secondary report delivery failed"
                );
            }
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify_detection(
        &self,
        channels: &[NotificationChannel],
        device_id: &str,
        kind: DetectionKind,
        confidence: f64,
    ) {
        let message = detection_message(device_id, kind, confidence);
        self.deliver(channels, device_id, &message).await;
        self.report_secondary(device_id, kind, confidence).await;
    }

    async fn notify_mismatch(
        &self,
        channels: &[NotificationChannel],
        device_id: &str,
        distance_km: Option<f64>,
        region: &str,
    ) {
        let message = mismatch_message(device_id, distance_km, region);
        self.deliver(channels, device_id, &message).await;
    }
}
