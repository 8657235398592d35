//! Database migration support with schema versioning and PostGIS setup.

use crate::error::{DbError, DbResult};
use crate::pool::Pool;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

/// Migration metadata.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version.
    pub version: i32,
    /// Migration name.
    pub name: String,
    /// SQL to run for upgrade.
    pub up: String,
    /// SQL to run for downgrade.
    pub down: String,
    /// Applied timestamp.
    pub applied_at: Option<DateTime<Utc>>,
}

impl Migration {
    /// Creates a new migration.
    pub fn new(
        version: i32,
        name: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            version,
            name: name.into(),
            up: up.into(),
            down: down.into(),
            applied_at: None,
        }
    }
}

/// Migration manager.
pub struct MigrationManager {
    pool: PgPool,
}

impl MigrationManager {
    /// Creates a new migration manager.
    pub fn new(pool: &Pool) -> Self {
        Self {
            pool: pool.inner().clone(),
        }
    }

    /// Initializes migration tracking table.
    pub async fn init(&self) -> DbResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::MigrationError(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    /// Gets the current schema version.
    pub async fn current_version(&self) -> DbResult<Option<i32>> {
        let version: Option<i32> =
            sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
                .fetch_optional(&self.pool)
                .await?
                .flatten();

        Ok(version)
    }

    /// Gets all applied migrations.
    pub async fn applied_migrations(&self) -> DbResult<Vec<Migration>> {
        let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
            .fetch_all(&self.pool)
            .await?;

        let migrations = rows
            .iter()
            .map(|row| Migration {
                version: row.get("version"),
                name: row.get("name"),
                up: String::new(),
                down: String::new(),
                applied_at: Some(row.get("applied_at")),
            })
            .collect();

        Ok(migrations)
    }

    /// Applies a migration.
    pub async fn apply(&self, migration: &Migration) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::MigrationError(format!("Failed to start transaction: {}", e)))?;

        sqlx::query(&migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DbError::MigrationError(format!(
                    "Failed to apply migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, name) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(&migration.name)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::MigrationError(format!("Failed to record migration: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DbError::MigrationError(format!("Failed to commit migration: {}", e)))?;

        Ok(())
    }

    /// Rolls back a migration.
    pub async fn rollback(&self, migration: &Migration) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::MigrationError(format!("Failed to start transaction: {}", e)))?;

        sqlx::query(&migration.down)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DbError::MigrationError(format!(
                    "Failed to rollback migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("DELETE FROM _migrations WHERE version = $1")
            .bind(migration.version)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::MigrationError(format!("Failed to remove migration record: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DbError::MigrationError(format!("Failed to commit rollback: {}", e)))?;

        Ok(())
    }

    /// Runs all pending migrations.
    pub async fn migrate(&self, migrations: &[Migration]) -> DbResult<()> {
        self.init().await?;

        let current = self.current_version().await?.unwrap_or(0);

        for migration in migrations {
            if migration.version > current {
                tracing::info!(version = migration.version, name = %migration.name, "applying migration");
                self.apply(migration).await?;
            }
        }

        Ok(())
    }

    /// Checks whether the PostGIS extension is installed.
    pub async fn postgis_installed(&self) -> DbResult<bool> {
        let result: Option<String> =
            sqlx::query_scalar("SELECT extname FROM pg_extension WHERE extname = 'postgis'")
                .fetch_optional(&self.pool)
                .await?;

        Ok(result.is_some())
    }

    /// Installs the PostGIS extension.
    pub async fn install_postgis(&self) -> DbResult<()> {
        if self.postgis_installed().await? {
            return Ok(());
        }

        sqlx::query("CREATE EXTENSION IF NOT EXISTS postgis")
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::PostGisError(format!("Failed to install PostGIS: {}", e)))?;

        Ok(())
    }

    /// Gets the installed PostGIS version.
    pub async fn postgis_version(&self) -> DbResult<String> {
        let version: String = sqlx::query_scalar("SELECT PostGIS_Version()")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::PostGisError(format!("Failed to get PostGIS version: {}", e)))?;

        Ok(version)
    }
}

/// Creates the base schema migration: forest parcels, admin boundaries
/// (regions/departements/communes), and cadastral parcels, all geometry in
/// EPSG:4326.
pub fn create_base_schema() -> Migration {
    Migration::new(
        1,
        "create_base_schema",
        r#"
        CREATE EXTENSION IF NOT EXISTS postgis;

        CREATE TABLE forest_parcels (
            id UUID PRIMARY KEY,
            code_tfv TEXT NOT NULL,
            libelle TEXT NOT NULL,
            essence1 TEXT,
            departement TEXT NOT NULL,
            geom GEOMETRY(MultiPolygon, 4326) NOT NULL
        );

        CREATE TABLE admin_regions (
            id UUID PRIMARY KEY,
            code TEXT NOT NULL,
            nom TEXT NOT NULL,
            parent_code TEXT,
            geom GEOMETRY(MultiPolygon, 4326) NOT NULL
        );

        CREATE TABLE admin_departements (
            id UUID PRIMARY KEY,
            code TEXT NOT NULL,
            nom TEXT NOT NULL,
            parent_code TEXT,
            geom GEOMETRY(MultiPolygon, 4326) NOT NULL
        );

        CREATE TABLE admin_communes (
            id UUID PRIMARY KEY,
            code TEXT NOT NULL,
            nom TEXT NOT NULL,
            parent_code TEXT,
            geom GEOMETRY(MultiPolygon, 4326) NOT NULL
        );

        CREATE TABLE cadastral_parcels (
            id UUID PRIMARY KEY,
            code_commune TEXT NOT NULL,
            departement TEXT NOT NULL,
            section TEXT NOT NULL,
            numero TEXT NOT NULL,
            geom GEOMETRY(MultiPolygon, 4326) NOT NULL
        );
        "#,
        r#"
        DROP TABLE IF EXISTS cadastral_parcels;
        DROP TABLE IF EXISTS admin_communes;
        DROP TABLE IF EXISTS admin_departements;
        DROP TABLE IF EXISTS admin_regions;
        DROP TABLE IF EXISTS forest_parcels;
        "#,
    )
}

/// Creates the spatial (GIST) indexes the tile and polygon-analysis queries
/// rely on.
pub fn create_spatial_indexes() -> Migration {
    Migration::new(
        2,
        "create_spatial_indexes",
        r#"
        CREATE INDEX idx_forest_parcels_geom ON forest_parcels USING GIST(geom);
        CREATE INDEX idx_admin_regions_geom ON admin_regions USING GIST(geom);
        CREATE INDEX idx_admin_departements_geom ON admin_departements USING GIST(geom);
        CREATE INDEX idx_admin_communes_geom ON admin_communes USING GIST(geom);
        CREATE INDEX idx_cadastral_parcels_geom ON cadastral_parcels USING GIST(geom);

        CREATE INDEX idx_forest_parcels_code_tfv ON forest_parcels(code_tfv);
        CREATE INDEX idx_cadastral_parcels_commune ON cadastral_parcels(code_commune);
        "#,
        r#"
        DROP INDEX IF EXISTS idx_cadastral_parcels_commune;
        DROP INDEX IF EXISTS idx_forest_parcels_code_tfv;
        DROP INDEX IF EXISTS idx_cadastral_parcels_geom;
        DROP INDEX IF EXISTS idx_admin_communes_geom;
        DROP INDEX IF EXISTS idx_admin_departements_geom;
        DROP INDEX IF EXISTS idx_admin_regions_geom;
        DROP INDEX IF EXISTS idx_forest_parcels_geom;
        "#,
    )
}

/// Gets all default migrations, in application order.
pub fn default_migrations() -> Vec<Migration> {
    vec![create_base_schema(), create_spatial_indexes()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creation() {
        let migration = Migration::new(1, "test", "CREATE TABLE test (id INT)", "DROP TABLE test");
        assert_eq!(migration.version, 1);
        assert_eq!(migration.name, "test");
        assert!(migration.applied_at.is_none());
    }

    #[test]
    fn test_default_migrations() {
        let migrations = default_migrations();
        assert_eq!(migrations.len(), 2);
        assert_eq!(migrations[0].version, 1);
        assert_eq!(migrations[1].version, 2);
    }
}
