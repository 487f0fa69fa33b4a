//! Runtime configuration loaded once at startup.
//!
//! Values come from environment variables (a `.env` file is loaded by the
//! server binary before this runs). Secrets must be injected via the
//! environment in production; the compiled-in defaults exist for local
//! development only.

use crate::defaults;

/// Application settings, loaded once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Settings {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HTTP bind host.
    pub host: String,
    /// HTTP bind port.
    pub port: u16,

    /// HMAC secret for user JWTs.
    pub jwt_secret: String,
    /// Access token lifetime in minutes.
    pub jwt_access_minutes: i64,
    /// Refresh token lifetime in days.
    pub jwt_refresh_days: i64,

    /// Shared manufacturing secret used to derive factory tokens.
    /// Field-trial scheme; production provisioning moves to one-time
    /// challenges.
    pub factory_secret: String,
    /// Base URL of the QR setup page.
    pub setup_base_url: String,

    /// IP geolocation endpoint.
    pub geolocation_api_url: String,
    /// Location-mismatch distance threshold in kilometers.
    pub mismatch_threshold_km: f64,

    /// LINE Notify endpoint for owner alerts.
    pub line_notify_url: String,
    /// Optional secondary event-report sink (transitional; off unless set).
    pub secondary_report_url: Option<String>,
    /// Bearer token for the secondary report sink.
    pub secondary_report_token: Option<String>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Settings {
    /// Load settings from the environment, falling back to development
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: env_or("DATABASE_URL", defaults::DATABASE_URL),
            host: env_or("HOST", defaults::HOST),
            port: env_parse("PORT", defaults::PORT),
            jwt_secret: env_or("JWT_SECRET", "change-me-in-production"),
            jwt_access_minutes: env_parse("JWT_ACCESS_MINUTES", defaults::JWT_ACCESS_MINUTES),
            jwt_refresh_days: env_parse("JWT_REFRESH_DAYS", defaults::JWT_REFRESH_DAYS),
            factory_secret: env_or("FACTORY_SECRET", "boreal-dev-factory-secret"),
            setup_base_url: env_or("SETUP_BASE_URL", defaults::SETUP_BASE_URL),
            geolocation_api_url: env_or("GEOLOCATION_API_URL", defaults::GEOLOCATION_API_URL),
            mismatch_threshold_km: env_parse(
                "MISMATCH_THRESHOLD_KM",
                defaults::MISMATCH_THRESHOLD_KM,
            ),
            line_notify_url: env_or("LINE_NOTIFY_URL", defaults::LINE_NOTIFY_URL),
            secondary_report_url: std::env::var("SECONDARY_REPORT_URL").ok(),
            secondary_report_token: std::env::var("SECONDARY_REPORT_TOKEN").ok(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: defaults::DATABASE_URL.to_string(),
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_access_minutes: defaults::JWT_ACCESS_MINUTES,
            jwt_refresh_days: defaults::JWT_REFRESH_DAYS,
            factory_secret: "boreal-dev-factory-secret".to_string(),
            setup_base_url: defaults::SETUP_BASE_URL.to_string(),
            geolocation_api_url: defaults::GEOLOCATION_API_URL.to_string(),
            mismatch_threshold_km: defaults::MISMATCH_THRESHOLD_KM,
            line_notify_url: defaults::LINE_NOTIFY_URL.to_string(),
            secondary_report_url: None,
            secondary_report_token: None,
        }
    }
}
