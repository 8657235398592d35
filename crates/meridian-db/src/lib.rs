//! PostGIS database integration for the tile and polygon-analysis service.
//!
//! # Features
//!
//! - **Connection pool management** with health checks.
//! - **Repositories** for forest, admin-boundary, and cadastral tile
//!   production plus the polygon-analysis queries, all using positionally
//!   bound parameters.
//! - **Transaction support** with savepoints and rollback.
//! - **Migration system** for schema versioning.
//!
//! # Example
//!
//! ```rust,no_run
//! use meridian_db::{Pool, PoolConfig, init_database, ForestRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PoolConfig::builder()
//!         .host("localhost")
//!         .database("meridian")
//!         .username("postgres")
//!         .password("password")
//!         .max_connections(20)
//!         .build();
//!
//!     let pool = Pool::new(config).await?;
//!     init_database(&pool).await?;
//!
//!     let forests = ForestRepository::new(&pool);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod repository;
pub mod transaction;

pub use error::{DbError, DbResult};
pub use migrations::{default_migrations, Migration, MigrationManager};
pub use models::{
    AdminBoundaryRow, AdminLayer, CadastralParcelRow, ForestBreakdownRow, ForestIntersectionSummaryRow,
    ForestParcelRow, MvtParams, TileEnvelope,
};
pub use pool::{HealthStatus, Pool, PoolConfig, PoolStats};
pub use repository::{AdminRepository, CadastreRepository, ForestRepository};
pub use transaction::{DbTransaction, IsolationLevel, TransactionManager};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initializes the database: installs PostGIS and runs pending migrations.
pub async fn init_database(pool: &Pool) -> DbResult<()> {
    let migrator = MigrationManager::new(pool);

    migrator.install_postgis().await?;

    let migrations = default_migrations();
    migrator.migrate(&migrations).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
