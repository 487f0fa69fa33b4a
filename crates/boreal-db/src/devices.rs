//! Device registry repository implementation.
//!
//! The registration transition (unbound → owned) relies on the primary key
//! plus a conditional update instead of an application-level lock: two
//! concurrent first-registrations race at the database, and exactly one wins.

use chrono::Utc;
use sqlx::types::Json;
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use boreal_core::{
    generate_api_token, DetectionKind, Device, DeviceStatus, Error, NotificationChannel, Result,
};

/// PostgreSQL repository for the device registry.
pub struct PgDeviceRepository {
    pool: Pool<Postgres>,
}

impl PgDeviceRepository {
    /// Create a new PgDeviceRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Look up a device by id.
    pub async fn find(&self, device_id: &str) -> Result<Option<Device>> {
        let device = sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE device_id = $1")
            .bind(device_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(device)
    }

    /// Look up the device bound to an api_token (device credential auth).
    pub async fn find_by_api_token(&self, api_token: &str) -> Result<Option<Device>> {
        let device = sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE api_token = $1")
            .bind(api_token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(device)
    }

    /// Return the device only if it is owned by the given user.
    pub async fn find_for_owner(&self, device_id: &str, user_id: Uuid) -> Result<Option<Device>> {
        let device = sqlx::query_as::<_, Device>(
            "SELECT * FROM devices WHERE device_id = $1 AND owner_user_id = $2",
        )
        .bind(device_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(device)
    }

    /// Bind a device to an owner, issuing a fresh api_token.
    ///
    /// - no row yet: created here with the supplied token hash (no
    ///   pre-registration step)
    /// - row exists, unbound: owner and token are set
    /// - row exists, already owned: `Error::Conflict`
    ///
    /// A registration that loses a race (insert collides, or the conditional
    /// update matches zero rows because another request bound first) also
    /// surfaces as `Error::Conflict` — it never silently succeeds twice.
    pub async fn register(
        &self,
        device_id: &str,
        factory_token_hash: &str,
        owner_user_id: Uuid,
    ) -> Result<Device> {
        let existing = self.find(device_id).await?;

        if let Some(device) = &existing {
            if device.is_bound() {
                return Err(Error::Conflict(format!(
                    "device {} is already registered",
                    device_id
                )));
            }
        }

        let api_token = generate_api_token();

        let bound = if existing.is_none() {
            sqlx::query_as::<_, Device>(
                "INSERT INTO devices (device_id, factory_token_hash, owner_user_id, api_token)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (device_id) DO NOTHING
                 RETURNING *",
            )
            .bind(device_id)
            .bind(factory_token_hash)
            .bind(owner_user_id)
            .bind(&api_token)
            .fetch_optional(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Device>(
                "UPDATE devices SET owner_user_id = $2, api_token = $3
                 WHERE device_id = $1 AND owner_user_id IS NULL
                 RETURNING *",
            )
            .bind(device_id)
            .bind(owner_user_id)
            .bind(&api_token)
            .fetch_optional(&self.pool)
            .await?
        };

        debug!(
            subsystem = "db",
            component = "devices",
            op = "register",
            device_id,
            success = bound.is_some(),
            "Device bind attempt"
        );

        bound.ok_or_else(|| {
            Error::Conflict(format!(
                "device {} was registered concurrently",
                device_id
            ))
        })
    }

    /// Store owner preferences: notification channels and detection targets.
    /// `None` leaves the stored value untouched.
    pub async fn update_setup(
        &self,
        device_id: &str,
        notification_channels: Option<Vec<NotificationChannel>>,
        detection_targets: Option<Vec<DetectionKind>>,
    ) -> Result<Device> {
        let device = sqlx::query_as::<_, Device>(
            "UPDATE devices
             SET notification_channels = COALESCE($2, notification_channels),
                 detection_targets = COALESCE($3, detection_targets)
             WHERE device_id = $1
             RETURNING *",
        )
        .bind(device_id)
        .bind(notification_channels.map(Json))
        .bind(detection_targets.map(Json))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::DeviceNotFound(device_id.to_string()))?;

        Ok(device)
    }

    /// Flip the operational status (activate / suspend).
    pub async fn set_status(&self, device_id: &str, status: DeviceStatus) -> Result<()> {
        let result = sqlx::query("UPDATE devices SET status = $2 WHERE device_id = $1")
            .bind(device_id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::DeviceNotFound(device_id.to_string()));
        }
        Ok(())
    }

    /// Heartbeat: record the current time as the device's last contact.
    pub async fn touch_last_seen(&self, device_id: &str) -> Result<()> {
        sqlx::query("UPDATE devices SET last_seen = $2 WHERE device_id = $1")
            .bind(device_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
