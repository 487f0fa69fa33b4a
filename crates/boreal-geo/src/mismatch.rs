//! Location-mismatch policy.

use std::net::IpAddr;

use tracing::debug;

use boreal_core::defaults::MISMATCH_THRESHOLD_KM;
use boreal_core::Result;

use crate::distance::haversine_km;
use crate::provider::GeolocationProvider;

/// Outcome of a mismatch evaluation for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// True when the event IP geolocates implausibly far from the placement.
    pub mismatch: bool,
    /// Haversine distance in km, rounded to 3 decimals. None when the
    /// lookup was unavailable.
    pub distance_km: Option<f64>,
    /// Region the event IP resolved to; empty when unavailable.
    pub region: String,
}

impl Verdict {
    fn inconclusive() -> Self {
        Self {
            mismatch: false,
            distance_km: None,
            region: String::new(),
        }
    }
}

/// Mismatch decision rule: distance threshold plus regional comparison.
#[derive(Debug, Clone)]
pub struct MismatchPolicy {
    /// Distance at or beyond which the flag trips, in kilometers.
    pub threshold_km: f64,
}

impl Default for MismatchPolicy {
    fn default() -> Self {
        Self {
            threshold_km: MISMATCH_THRESHOLD_KM,
        }
    }
}

impl MismatchPolicy {
    pub fn new(threshold_km: f64) -> Self {
        Self { threshold_km }
    }

    /// Compare an event origin IP against the registered placement.
    ///
    /// When the lookup comes back unavailable the verdict is conclusively
    /// "no mismatch" — inconclusive data must not raise alerts. Otherwise
    /// the flag trips when the distance reaches the threshold, or when both
    /// region strings are non-empty and disagree (an empty side skips the
    /// regional comparison entirely).
    pub async fn check(
        &self,
        provider: &dyn GeolocationProvider,
        registered_lat: f64,
        registered_lon: f64,
        registered_region: &str,
        event_ip: IpAddr,
    ) -> Result<Verdict> {
        let resolved = match provider.lookup(event_ip).await? {
            Some(r) => r,
            None => return Ok(Verdict::inconclusive()),
        };

        let distance_km =
            haversine_km(registered_lat, registered_lon, resolved.lat, resolved.lon);

        let distance_mismatch = distance_km >= self.threshold_km;
        let region_mismatch = !registered_region.is_empty()
            && !resolved.region.is_empty()
            && registered_region != resolved.region;

        let mismatch = distance_mismatch || region_mismatch;

        debug!(
            subsystem = "geo",
            component = "mismatch",
            op = "check",
            %event_ip,
            distance_km,
            mismatch,
            "Evaluated location mismatch"
        );

        Ok(Verdict {
            mismatch,
            distance_km: Some((distance_km * 1000.0).round() / 1000.0),
            region: resolved.region,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGeolocation;
    use crate::provider::ResolvedIp;

    const IP: &str = "203.0.113.10";

    // Matsumoto area, the reference placement used throughout.
    const REG: (f64, f64) = (36.2380, 137.9723);

    fn ip() -> IpAddr {
        IP.parse().unwrap()
    }

    #[tokio::test]
    async fn test_unavailable_lookup_never_flags() {
        let provider = MockGeolocation::unavailable();
        let verdict = MismatchPolicy::default()
            .check(&provider, REG.0, REG.1, "", ip())
            .await
            .unwrap();
        assert!(!verdict.mismatch);
        assert_eq!(verdict.distance_km, None);
        assert_eq!(verdict.region, "");
    }

    #[tokio::test]
    async fn test_nearby_same_region_does_not_flag() {
        // ~2.3 km north of the placement
        let provider = MockGeolocation::fixed(ResolvedIp {
            region: "Nagano".to_string(),
            lat: 36.2587,
            lon: 137.9723,
        });
        let verdict = MismatchPolicy::default()
            .check(&provider, REG.0, REG.1, "Nagano", ip())
            .await
            .unwrap();
        assert!(!verdict.mismatch);
        let d = verdict.distance_km.unwrap();
        assert!(d > 2.0 && d < 2.6, "got {} km", d);
    }

    #[tokio::test]
    async fn test_distance_at_threshold_flags() {
        // ~212 km away (Tokyo area)
        let provider = MockGeolocation::fixed(ResolvedIp {
            region: "Tokyo".to_string(),
            lat: 35.6895,
            lon: 139.6917,
        });
        let verdict = MismatchPolicy::default()
            .check(&provider, REG.0, REG.1, "", ip())
            .await
            .unwrap();
        assert!(verdict.mismatch);
        let d = verdict.distance_km.unwrap();
        assert!(d >= 150.0, "got {} km", d);
        assert_eq!(verdict.region, "Tokyo");
    }

    #[tokio::test]
    async fn test_region_disagreement_flags_even_when_near() {
        // 0 km away but regions disagree
        let provider = MockGeolocation::fixed(ResolvedIp {
            region: "Gifu".to_string(),
            lat: REG.0,
            lon: REG.1,
        });
        let verdict = MismatchPolicy::default()
            .check(&provider, REG.0, REG.1, "Nagano", ip())
            .await
            .unwrap();
        assert!(verdict.mismatch);
        assert_eq!(verdict.distance_km, Some(0.0));
    }

    #[tokio::test]
    async fn test_empty_registered_region_skips_region_rule() {
        let provider = MockGeolocation::fixed(ResolvedIp {
            region: "Gifu".to_string(),
            lat: REG.0,
            lon: REG.1,
        });
        let verdict = MismatchPolicy::default()
            .check(&provider, REG.0, REG.1, "", ip())
            .await
            .unwrap();
        assert!(!verdict.mismatch);
    }

    #[tokio::test]
    async fn test_empty_resolved_region_skips_region_rule() {
        let provider = MockGeolocation::fixed(ResolvedIp {
            region: String::new(),
            lat: REG.0,
            lon: REG.1,
        });
        let verdict = MismatchPolicy::default()
            .check(&provider, REG.0, REG.1, "Nagano", ip())
            .await
            .unwrap();
        assert!(!verdict.mismatch);
    }

    #[tokio::test]
    async fn test_distance_is_rounded_to_three_decimals() {
        let provider = MockGeolocation::fixed(ResolvedIp {
            region: String::new(),
            lat: 36.2587,
            lon: 137.9723,
        });
        let verdict = MismatchPolicy::default()
            .check(&provider, REG.0, REG.1, "", ip())
            .await
            .unwrap();
        let d = verdict.distance_km.unwrap();
        assert_eq!(d, (d * 1000.0).round() / 1000.0);
    }

    #[tokio::test]
    async fn test_threshold_boundary_is_inclusive() {
        let resolved = ResolvedIp {
            region: String::new(),
            lat: 36.2587,
            lon: 137.9723,
        };
        let exact = haversine_km(REG.0, REG.1, resolved.lat, resolved.lon);

        let provider = MockGeolocation::fixed(resolved.clone());
        let verdict = MismatchPolicy::new(exact)
            .check(&provider, REG.0, REG.1, "", ip())
            .await
            .unwrap();
        assert!(verdict.mismatch, "exactly-at-threshold must flag");

        let provider = MockGeolocation::fixed(resolved);
        let verdict = MismatchPolicy::new(exact + 1e-9)
            .check(&provider, REG.0, REG.1, "", ip())
            .await
            .unwrap();
        assert!(!verdict.mismatch, "just-under-threshold must not flag");
    }

    #[tokio::test]
    async fn test_custom_threshold() {
        let provider = MockGeolocation::fixed(ResolvedIp {
            region: String::new(),
            lat: 36.2587, // ~2.3 km
            lon: 137.9723,
        });
        let verdict = MismatchPolicy::new(2.0)
            .check(&provider, REG.0, REG.1, "", ip())
            .await
            .unwrap();
        assert!(verdict.mismatch);
    }
}
