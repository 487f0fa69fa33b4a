//! Geolocation provider abstraction.

use std::net::IpAddr;

use async_trait::async_trait;

use boreal_core::Result;

/// Where an IP address resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIp {
    /// Region name (prefecture/state level).
    pub region: String,
    pub lat: f64,
    pub lon: f64,
}

/// Resolves a public IP to an approximate region and coordinate.
///
/// `Ok(None)` means "unavailable": private address, provider error, timeout,
/// or a non-success provider status. Callers treat unavailable as
/// inconclusive and must not raise alerts from it.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn lookup(&self, ip: IpAddr) -> Result<Option<ResolvedIp>>;
}

/// Whether an address is globally routable enough to geolocate.
///
/// Private, loopback, and link-local addresses are rejected up front so no
/// network call is wasted on them.
pub fn is_global_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => !(v4.is_private() || v4.is_loopback() || v4.is_link_local()),
        IpAddr::V6(v6) => {
            // fe80::/10 link-local; fc00::/7 unique-local
            let segments = v6.segments();
            let link_local = (segments[0] & 0xffc0) == 0xfe80;
            let unique_local = (segments[0] & 0xfe00) == 0xfc00;
            !(v6.is_loopback() || link_local || unique_local)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_v4_ranges_are_not_global() {
        for ip in ["10.0.0.1", "172.16.0.1", "192.168.1.1", "127.0.0.1", "169.254.0.1"] {
            assert!(!is_global_ip(ip.parse().unwrap()), "{} should not be global", ip);
        }
    }

    #[test]
    fn test_public_v4_is_global() {
        assert!(is_global_ip("203.0.113.10".parse().unwrap()));
    }

    #[test]
    fn test_v6_loopback_and_local_are_not_global() {
        for ip in ["::1", "fe80::1", "fc00::1"] {
            assert!(!is_global_ip(ip.parse().unwrap()), "{} should not be global", ip);
        }
    }

    #[test]
    fn test_public_v6_is_global() {
        assert!(is_global_ip("2001:db8::1".parse().unwrap()));
    }
}
