//! Detection event repository implementation.
//!
//! Live ingestion uses a caller-owned transaction: the event is inserted
//! provisionally (mismatch false) to obtain its id, the mismatch evaluation
//! amends it, and the whole thing commits as one unit. Partial writes are
//! never observable.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction};

use boreal_core::{DetectionEvent, DetectionKind, Result};

/// Fields of a detection report as supplied by the device.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub detected_at: DateTime<Utc>,
    pub detection_type: DetectionKind,
    pub confidence: f64,
    pub ip_address: Option<String>,
}

/// PostgreSQL repository for detection events.
pub struct PgEventRepository {
    pool: Pool<Postgres>,
}

impl PgEventRepository {
    /// Create a new PgEventRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Start an ingestion transaction.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    /// Insert an event with provisional mismatch fields, returning its id.
    ///
    /// Runs inside the caller's transaction so the later amendment and this
    /// insert commit together.
    pub async fn insert_provisional(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        device_id: &str,
        event: &NewEvent,
    ) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO detection_events
                 (device_id, detected_at, detection_type, confidence, ip_address, location_mismatch)
             VALUES ($1, $2, $3, $4, $5, FALSE)
             RETURNING id",
        )
        .bind(device_id)
        .bind(event.detected_at)
        .bind(event.detection_type)
        .bind(event.confidence)
        .bind(event.ip_address.as_deref())
        .fetch_one(&mut **tx)
        .await?;
        Ok(id)
    }

    /// Amend the geolocation outcome of a provisionally inserted event.
    pub async fn amend_geolocation(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        event_id: i64,
        region: Option<&str>,
        distance_km: Option<f64>,
        mismatch: bool,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE detection_events
             SET ip_geolocation_region = $2,
                 distance_from_registered_km = $3,
                 location_mismatch = $4
             WHERE id = $1",
        )
        .bind(event_id)
        .bind(region)
        .bind(distance_km)
        .bind(mismatch)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Insert a batch of offline-replayed events in one transaction.
    ///
    /// Mismatch evaluation is skipped for replayed events (stale timestamps,
    /// replay-time IP), so `location_mismatch` is forced false for every row.
    /// Returns the number of rows inserted.
    pub async fn insert_batch(&self, device_id: &str, events: &[NewEvent]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        for event in events {
            sqlx::query(
                "INSERT INTO detection_events
                     (device_id, detected_at, detection_type, confidence, location_mismatch)
                 VALUES ($1, $2, $3, $4, FALSE)",
            )
            .bind(device_id)
            .bind(event.detected_at)
            .bind(event.detection_type)
            .bind(event.confidence)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(events.len() as u64)
    }

    /// Look up a single event.
    pub async fn get(&self, event_id: i64) -> Result<Option<DetectionEvent>> {
        let event =
            sqlx::query_as::<_, DetectionEvent>("SELECT * FROM detection_events WHERE id = $1")
                .bind(event_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(event)
    }

    /// Recent events for a device, newest first.
    pub async fn list_for_device(
        &self,
        device_id: &str,
        limit: i64,
    ) -> Result<Vec<DetectionEvent>> {
        let events = sqlx::query_as::<_, DetectionEvent>(
            "SELECT * FROM detection_events
             WHERE device_id = $1
             ORDER BY detected_at DESC, id DESC
             LIMIT $2",
        )
        .bind(device_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}
