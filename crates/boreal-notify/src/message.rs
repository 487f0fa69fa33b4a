//! Notification message builders.

use boreal_core::DetectionKind;

/// Owner-facing message for a detection event.
pub fn detection_message(device_id: &str, kind: DetectionKind, confidence: f64) -> String {
    format!(
        "\n[Boreal detection alert]\nDevice: {}\nDetected: {}\nConfidence: {:.1}%",
        device_id,
        kind.label(),
        confidence * 100.0
    )
}

/// Owner-facing message for a location-mismatch alert.
pub fn mismatch_message(device_id: &str, distance_km: Option<f64>, region: &str) -> String {
    let distance = distance_km
        .map(|d| format!("{:.0}km", d))
        .unwrap_or_else(|| "unknown".to_string());
    let region = if region.is_empty() { "unknown" } else { region };
    format!(
        "\n[Boreal location alert]\nDevice: {}\nReporting region: {}\nDistance from registered placement: {}\nThe device is communicating from far outside its installed position.",
        device_id, region, distance
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_message_contents() {
        let msg = detection_message("BX-1", DetectionKind::Bear, 0.93);
        assert!(msg.contains("BX-1"));
        assert!(msg.contains("bear"));
        assert!(msg.contains("93.0%"));
    }

    #[test]
    fn test_mismatch_message_with_distance() {
        let msg = mismatch_message("BX-1", Some(212.5), "Tokyo");
        assert!(msg.contains("BX-1"));
        assert!(msg.contains("Tokyo"));
        assert!(msg.contains("213km") || msg.contains("212km"));
    }

    #[test]
    fn test_mismatch_message_without_distance_or_region() {
        let msg = mismatch_message("BX-1", None, "");
        assert!(msg.contains("unknown"));
    }
}
