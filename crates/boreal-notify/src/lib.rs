//! # boreal-notify
//!
//! Best-effort notification dispatch for detection events and
//! location-mismatch alerts.
//!
//! Delivery is strictly fire-and-forget from the ingestion path's point of
//! view: a failed or slow delivery is logged and dropped, never surfaced to
//! the device, and never rolls back a stored event.

pub mod message;
pub mod mock;
pub mod notifier;

pub use message::{detection_message, mismatch_message};
pub use mock::MockNotifier;
pub use notifier::{HttpNotifier, Notifier, SecondaryReport};
