//! # boreal-db
//!
//! PostgreSQL database layer for boreal.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for all core entities
//! - The transactional guarantees the ingestion and placement flows rely on
//!
//! ## Example
//!
//! ```rust,ignore
//! use boreal_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/boreal").await?;
//!     let device = db.devices.find("BX-00000001-0001").await?;
//!     println!("{:?}", device);
//!     Ok(())
//! }
//! ```

pub mod devices;
pub mod events;
pub mod locations;
pub mod pool;
pub mod users;

// Re-export core types
pub use boreal_core::*;

// Re-export repository implementations
pub use devices::PgDeviceRepository;
pub use events::{NewEvent, PgEventRepository};
pub use locations::{accuracy_warning, PgLocationRepository};
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use users::PgUserRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// User account repository.
    pub users: PgUserRepository,
    /// Device registry repository.
    pub devices: PgDeviceRepository,
    /// Placement history repository.
    pub locations: PgLocationRepository,
    /// Detection event repository.
    pub events: PgEventRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            devices: PgDeviceRepository::new(pool.clone()),
            locations: PgLocationRepository::new(pool.clone()),
            events: PgEventRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
