//! Mock geolocation provider for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use boreal_geo::{MockGeolocation, ResolvedIp};
//!
//! let provider = MockGeolocation::fixed(ResolvedIp {
//!     region: "Nagano".to_string(),
//!     lat: 36.2,
//!     lon: 137.9,
//! });
//! ```

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use boreal_core::Result;

use crate::provider::{GeolocationProvider, ResolvedIp};

/// Mock geolocation provider with per-IP responses.
#[derive(Default)]
pub struct MockGeolocation {
    fixed: Option<ResolvedIp>,
    per_ip: Mutex<HashMap<IpAddr, ResolvedIp>>,
    lookups: AtomicUsize,
}

impl MockGeolocation {
    /// Provider that resolves every IP to the same location.
    pub fn fixed(resolved: ResolvedIp) -> Self {
        Self {
            fixed: Some(resolved),
            ..Default::default()
        }
    }

    /// Provider that is always unavailable.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Map a specific IP to a specific resolution.
    pub fn with_ip(self, ip: IpAddr, resolved: ResolvedIp) -> Self {
        self.per_ip.lock().unwrap().insert(ip, resolved);
        self
    }

    /// Number of lookups performed so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeolocationProvider for MockGeolocation {
    async fn lookup(&self, ip: IpAddr) -> Result<Option<ResolvedIp>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(resolved) = self.per_ip.lock().unwrap().get(&ip) {
            return Ok(Some(resolved.clone()));
        }
        Ok(self.fixed.clone())
    }
}
