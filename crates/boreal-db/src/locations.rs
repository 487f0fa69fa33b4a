//! Placement history repository implementation.
//!
//! Append-only: coordinates are never edited. Superseding a placement flips
//! the previous `active` row to false and inserts the new one inside a single
//! transaction, so a crash between the two statements cannot leave zero or
//! multiple active rows.

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use boreal_core::{LocationHistory, Result};

/// GPS accuracy above which a mild advisory is attached (meters).
const ACCURACY_WARN_M: f64 = 50.0;

/// GPS accuracy above which a stronger advisory is attached (meters).
const ACCURACY_ALERT_M: f64 = 100.0;

/// Build the accuracy advisory for a placement registration.
///
/// Advisory only — poor accuracy never fails the registration.
pub fn accuracy_warning(accuracy_m: Option<f64>) -> Option<String> {
    let accuracy = accuracy_m?;
    if accuracy > ACCURACY_ALERT_M {
        Some(format!(
            "GPS precision low ({:.1}m). Re-registering the placement is recommended.",
            accuracy
        ))
    } else if accuracy > ACCURACY_WARN_M {
        Some(format!(
            "GPS precision {:.1}m. Under 50m is recommended.",
            accuracy
        ))
    } else {
        None
    }
}

/// PostgreSQL repository for the placement history.
pub struct PgLocationRepository {
    pool: Pool<Postgres>,
}

impl PgLocationRepository {
    /// Create a new PgLocationRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Register a new placement for a device.
    ///
    /// Deactivates the current active row and inserts the new one in a
    /// single transaction. Callers validate coordinate ranges beforehand.
    /// Returns the inserted row plus the accuracy advisory.
    pub async fn register(
        &self,
        device_id: &str,
        lat: f64,
        lon: f64,
        accuracy_m: Option<f64>,
        registered_by: Uuid,
        ip_address: Option<&str>,
    ) -> Result<(LocationHistory, Option<String>)> {
        let warning = accuracy_warning(accuracy_m);

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE location_history SET active = FALSE WHERE device_id = $1 AND active")
            .bind(device_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, LocationHistory>(
            "INSERT INTO location_history
                 (device_id, lat, lon, accuracy_m, registered_by, active, ip_address)
             VALUES ($1, $2, $3, $4, $5, TRUE, $6)
             RETURNING *",
        )
        .bind(device_id)
        .bind(lat)
        .bind(lon)
        .bind(accuracy_m)
        .bind(registered_by)
        .bind(ip_address)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((row, warning))
    }

    /// The device's current placement, if it ever registered one.
    pub async fn active(&self, device_id: &str) -> Result<Option<LocationHistory>> {
        let row = sqlx::query_as::<_, LocationHistory>(
            "SELECT * FROM location_history WHERE device_id = $1 AND active",
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Full placement history, newest first.
    pub async fn history(&self, device_id: &str) -> Result<Vec<LocationHistory>> {
        let rows = sqlx::query_as::<_, LocationHistory>(
            "SELECT * FROM location_history WHERE device_id = $1 ORDER BY registered_at DESC, id DESC",
        )
        .bind(device_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_warning_without_accuracy() {
        assert_eq!(accuracy_warning(None), None);
    }

    #[test]
    fn test_no_warning_at_50m() {
        assert_eq!(accuracy_warning(Some(50.0)), None);
    }

    #[test]
    fn test_mild_warning_just_above_50m() {
        let warning = accuracy_warning(Some(50.1)).expect("should warn");
        assert!(warning.contains("50.1"));
        assert!(!warning.contains("low"));
    }

    #[test]
    fn test_mild_warning_at_100m() {
        let warning = accuracy_warning(Some(100.0)).expect("should warn");
        assert!(warning.contains("100.0"));
        assert!(!warning.contains("low"));
    }

    #[test]
    fn test_strong_warning_above_100m() {
        let warning = accuracy_warning(Some(100.1)).expect("should warn");
        assert!(warning.contains("100.1"));
        assert!(warning.contains("low"));
    }
}
