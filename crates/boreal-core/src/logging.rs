//! Structured logging schema and field name constants for boreal.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated per request. Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "geo", "notify"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "ip_api", "pool", "dispatcher", "ingest"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "register_device", "ingest_event", "lookup", "send"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Device identifier being operated on.
pub const DEVICE_ID: &str = "device_id";

/// User UUID performing the operation.
pub const USER_ID: &str = "user_id";

/// Detection event row id.
pub const EVENT_ID: &str = "event_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Haversine distance from the registered placement, in kilometers.
pub const DISTANCE_KM: &str = "distance_km";

/// Whether the location-mismatch rule fired for an event.
pub const MISMATCH: &str = "mismatch";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
