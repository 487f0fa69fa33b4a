//! Centralized default constants for the boreal system.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// DATABASE
// =============================================================================

/// Default PostgreSQL connection URL (local development).
pub const DATABASE_URL: &str = "postgres://localhost/boreal";

// =============================================================================
// HTTP SERVER
// =============================================================================

/// Default bind host.
pub const HOST: &str = "0.0.0.0";

/// Default bind port.
pub const PORT: u16 = 8000;

// =============================================================================
// USER AUTH (JWT)
// =============================================================================

/// Access token lifetime in minutes.
pub const JWT_ACCESS_MINUTES: i64 = 60;

/// Refresh token lifetime in days.
pub const JWT_REFRESH_DAYS: i64 = 30;

// =============================================================================
// DEVICE PROVISIONING
// =============================================================================

/// Truncated hex length of factory_token and factory_token_hash.
pub const FACTORY_TOKEN_HEX_LEN: usize = 16;

/// Entropy of a freshly issued device api_token, in bytes.
pub const API_TOKEN_BYTES: usize = 32;

/// Default base URL of the browser setup page embedded in the QR payload.
pub const SETUP_BASE_URL: &str = "https://api.boreal.example/setup";

// =============================================================================
// GEOLOCATION
// =============================================================================

/// Default IP geolocation endpoint (ip-api.com style JSON API).
pub const GEOLOCATION_API_URL: &str = "http://ip-api.com/json";

/// Hard timeout for a single geolocation lookup, in seconds.
///
/// Deliberately shorter than the overall request timeout: a slow provider
/// degrades to "unavailable" instead of stalling event ingestion.
pub const GEOLOCATION_TIMEOUT_SECS: u64 = 5;

/// Distance threshold for the location-mismatch flag, in kilometers.
///
/// Cellular IP geolocation commonly drifts by tens of kilometers, so the
/// margin is much larger to prevent false positives.
pub const MISMATCH_THRESHOLD_KM: f64 = 150.0;

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// LINE Notify API endpoint.
pub const LINE_NOTIFY_URL: &str = "https://notify-api.line.me/api/notify";

/// Timeout for a single notification delivery attempt, in seconds.
pub const NOTIFY_TIMEOUT_SECS: u64 = 10;
