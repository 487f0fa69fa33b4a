//! # boreal-geo
//!
//! IP geolocation and location-mismatch evaluation.
//!
//! A detection event arrives with an origin IP; this crate resolves that IP
//! to an approximate region/coordinate, computes the great-circle distance
//! to the device's registered placement, and applies the mismatch policy.
//! Lookup failure is an explicit `None` (unavailable), never an error the
//! ingestion path has to unwind — the policy fails closed toward no-alert.

pub mod distance;
pub mod ip_api;
pub mod mismatch;
pub mod mock;
pub mod provider;

pub use distance::haversine_km;
pub use ip_api::IpApiClient;
pub use mismatch::{MismatchPolicy, Verdict};
pub use mock::MockGeolocation;
pub use provider::{is_global_ip, GeolocationProvider, ResolvedIp};
