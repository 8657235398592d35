//! Repositories executing the tile and polygon-analysis queries.
//!
//! Every method binds its variable inputs positionally through `sqlx`; the
//! only interpolated SQL fragment anywhere in this module is the admin
//! table name, and that is selected by matching on the closed
//! [`AdminLayer`] enum in `queries::admin_tile_sql`, never from a raw string.

use crate::error::DbResult;
use crate::models::{
    AdminLayer, ForestBreakdownRow, ForestIntersectionSummaryRow, MvtParams, TileEnvelope,
};
use crate::pool::Pool;
use crate::queries;
use sqlx::{PgPool, Row};

/// Reads forest-cover tiles and runs the polygon-analysis queries against
/// the forest parcel table.
pub struct ForestRepository {
    pool: PgPool,
}

impl ForestRepository {
    /// Creates a new repository bound to a connection pool.
    pub fn new(pool: &Pool) -> Self {
        Self {
            pool: pool.inner().clone(),
        }
    }

    /// Produces the raw MVT bytes for a forest tile, or `None` when no
    /// feature intersects the envelope.
    pub async fn mvt_tile(
        &self,
        envelope: TileEnvelope,
        params: MvtParams,
    ) -> DbResult<Option<Vec<u8>>> {
        let row = sqlx::query(queries::forest_tile_sql())
            .bind(envelope.min_x)
            .bind(envelope.min_y)
            .bind(envelope.max_x)
            .bind(envelope.max_y)
            .bind(params.extent)
            .bind(params.buffer)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|r| r.try_get::<Vec<u8>, _>("mvt").ok()))
    }

    /// Q1: total intersected forest area (m², EPSG:2154) and parcel count.
    pub async fn summarize_intersection(
        &self,
        polygon_geojson: &str,
    ) -> DbResult<ForestIntersectionSummaryRow> {
        let row = sqlx::query_as::<_, ForestIntersectionSummaryRow>(queries::forest_summary_sql())
            .bind(polygon_geojson)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    /// Q2/Q3 source data: one row per intersecting parcel with its raw
    /// classification code, species code, and intersected area.
    pub async fn intersecting_breakdown(
        &self,
        polygon_geojson: &str,
    ) -> DbResult<Vec<ForestBreakdownRow>> {
        let rows = sqlx::query_as::<_, ForestBreakdownRow>(queries::forest_breakdown_sql())
            .bind(polygon_geojson)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

/// Reads administrative-boundary tiles, constrained to the closed
/// [`AdminLayer`] allow-list.
pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    /// Creates a new repository bound to a connection pool.
    pub fn new(pool: &Pool) -> Self {
        Self {
            pool: pool.inner().clone(),
        }
    }

    /// Produces the raw MVT bytes for an admin-boundary tile, or `None`
    /// when no feature intersects the envelope.
    pub async fn mvt_tile(
        &self,
        layer: AdminLayer,
        envelope: TileEnvelope,
        params: MvtParams,
    ) -> DbResult<Option<Vec<u8>>> {
        let sql = queries::admin_tile_sql(layer);

        let row = sqlx::query(&sql)
            .bind(envelope.min_x)
            .bind(envelope.min_y)
            .bind(envelope.max_x)
            .bind(envelope.max_y)
            .bind(params.extent)
            .bind(params.buffer)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|r| r.try_get::<Vec<u8>, _>("mvt").ok()))
    }
}

/// Reads cadastral-parcel tiles.
pub struct CadastreRepository {
    pool: PgPool,
}

impl CadastreRepository {
    /// Creates a new repository bound to a connection pool.
    pub fn new(pool: &Pool) -> Self {
        Self {
            pool: pool.inner().clone(),
        }
    }

    /// Produces the raw MVT bytes for a cadastre tile, or `None` when no
    /// feature intersects the envelope.
    pub async fn mvt_tile(
        &self,
        envelope: TileEnvelope,
        params: MvtParams,
    ) -> DbResult<Option<Vec<u8>>> {
        let row = sqlx::query(queries::cadastre_tile_sql())
            .bind(envelope.min_x)
            .bind(envelope.min_y)
            .bind(envelope.max_x)
            .bind(envelope.max_y)
            .bind(params.extent)
            .bind(params.buffer)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|r| r.try_get::<Vec<u8>, _>("mvt").ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mvt_params_default_matches_the_mvt_tile_contract() {
        let params = MvtParams::default();
        assert_eq!(params.extent, 4096);
        assert_eq!(params.buffer, 256);
    }
}
