//! Shared application state handed to every request handler.

use std::sync::Arc;

use boreal_core::Settings;
use boreal_db::Database;
use boreal_geo::{GeolocationProvider, MismatchPolicy};
use boreal_notify::Notifier;

/// Application state shared across all handlers.
///
/// Everything here is either a connection pool or read-only configuration;
/// handlers hold no cross-request mutable state of their own.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// IP geolocation collaborator, mockable in tests.
    pub geo: Arc<dyn GeolocationProvider>,
    /// Best-effort alert dispatch, mockable in tests.
    pub notifier: Arc<dyn Notifier>,
    pub mismatch_policy: MismatchPolicy,
    pub settings: Arc<Settings>,
}
