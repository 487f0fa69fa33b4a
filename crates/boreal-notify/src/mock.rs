//! In-memory notifier for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use boreal_core::{DetectionKind, NotificationChannel};

use crate::notifier::Notifier;

/// Recorded detection delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    pub device_id: String,
    pub kind: DetectionKind,
    pub confidence: f64,
    pub channel_count: usize,
}

/// Recorded mismatch delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct MismatchRecord {
    pub device_id: String,
    pub distance_km: Option<f64>,
    pub region: String,
}

/// Captures every dispatch call without performing any I/O.
#[derive(Debug, Default)]
pub struct MockNotifier {
    detections: Mutex<Vec<DetectionRecord>>,
    mismatches: Mutex<Vec<MismatchRecord>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detections(&self) -> Vec<DetectionRecord> {
        self.detections.lock().unwrap().clone()
    }

    pub fn mismatches(&self) -> Vec<MismatchRecord> {
        self.mismatches.lock().unwrap().clone()
    }

    pub fn detection_count(&self) -> usize {
        self.detections.lock().unwrap().len()
    }

    pub fn mismatch_count(&self) -> usize {
        self.mismatches.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify_detection(
        &self,
        channels: &[NotificationChannel],
        device_id: &str,
        kind: DetectionKind,
        confidence: f64,
    ) {
        self.detections.lock().unwrap().push(DetectionRecord {
            device_id: device_id.to_string(),
            kind,
            confidence,
            channel_count: channels.len(),
        });
    }

    async fn notify_mismatch(
        &self,
        channels: &[NotificationChannel],
        device_id: &str,
        distance_km: Option<f64>,
        region: &str,
    ) {
        let _ = channels;
        self.mismatches.lock().unwrap().push(MismatchRecord {
            device_id: device_id.to_string(),
            distance_km,
            region: region.to_string(),
        });
    }
}
