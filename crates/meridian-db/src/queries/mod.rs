//! SQL text for the tile and polygon-analysis queries.
//!
//! Every value that varies per request is bound positionally by the caller
//! (see `repository.rs`); the only thing ever interpolated into a query
//! string here is a table/layer name already matched against the closed
//! [`crate::models::AdminLayer`] enum, never a raw client-supplied string.

use crate::models::AdminLayer;

/// MVT query for the forest-cover layer.
///
/// Binds, in order: `min_x, min_y, max_x, max_y` (the Web Mercator tile
/// envelope), `extent`, `buffer`.
pub fn forest_tile_sql() -> &'static str {
    r#"
    WITH bounds AS (
        SELECT ST_MakeEnvelope($1, $2, $3, $4, 3857) AS envelope
    ),
    mvtgeom AS (
        SELECT
            ST_AsMVTGeom(
                ST_Transform(f.geom, 3857),
                bounds.envelope,
                $5,
                $6,
                true
            ) AS geom,
            f.id,
            f.code_tfv,
            f.libelle,
            f.essence1,
            f.departement
        FROM forest_parcels f, bounds
        WHERE ST_Intersects(f.geom, ST_Transform(bounds.envelope, 4326))
    )
    SELECT ST_AsMVT(mvtgeom.*, 'foret', $5, 'geom') AS mvt
    FROM mvtgeom
    "#
}

/// MVT query for a cadastral-parcel tile.
///
/// Binds, in order: `min_x, min_y, max_x, max_y`, `extent`, `buffer`.
pub fn cadastre_tile_sql() -> &'static str {
    r#"
    WITH bounds AS (
        SELECT ST_MakeEnvelope($1, $2, $3, $4, 3857) AS envelope
    ),
    mvtgeom AS (
        SELECT
            ST_AsMVTGeom(
                ST_Transform(c.geom, 3857),
                bounds.envelope,
                $5,
                $6,
                true
            ) AS geom,
            c.id,
            c.code_commune,
            c.departement,
            c.section,
            c.numero
        FROM cadastral_parcels c, bounds
        WHERE ST_Intersects(c.geom, ST_Transform(bounds.envelope, 4326))
    )
    SELECT ST_AsMVT(mvtgeom.*, 'cadastre', $5, 'geom') AS mvt
    FROM mvtgeom
    "#
}

/// MVT query for an admin-boundary tile.
///
/// `layer` selects the backing table by a literal drawn from the closed
/// [`AdminLayer`] enum; it is never a raw client string. Binds, in order:
/// `min_x, min_y, max_x, max_y`, `extent`, `buffer`.
pub fn admin_tile_sql(layer: AdminLayer) -> String {
    format!(
        r#"
        WITH bounds AS (
            SELECT ST_MakeEnvelope($1, $2, $3, $4, 3857) AS envelope
        ),
        mvtgeom AS (
            SELECT
                ST_AsMVTGeom(
                    ST_Transform(a.geom, 3857),
                    bounds.envelope,
                    $5,
                    $6,
                    true
                ) AS geom,
                a.id,
                a.code,
                a.nom,
                a.parent_code
            FROM {table} a, bounds
            WHERE ST_Intersects(a.geom, ST_Transform(bounds.envelope, 4326))
        )
        SELECT ST_AsMVT(mvtgeom.*, '{layer_name}', $5, 'geom') AS mvt
        FROM mvtgeom
        "#,
        table = layer.table(),
        layer_name = layer.as_str(),
    )
}

/// Q1 summary query: sum of intersected forest area (m², EPSG:2154) and a row count.
///
/// Binds a single parameter: the GeoJSON polygon literal.
pub fn forest_summary_sql() -> &'static str {
    r#"
    SELECT
        COALESCE(
            SUM(ST_Area(ST_Transform(
                ST_Intersection(f.geom, ST_SetSRID(ST_GeomFromGeoJSON($1), 4326)),
                2154
            ))),
            0
        ) AS intersected_area_m2,
        COUNT(*) AS parcel_count
    FROM forest_parcels f
    WHERE ST_Intersects(f.geom, ST_SetSRID(ST_GeomFromGeoJSON($1), 4326))
    "#
}

/// Q2/Q3 breakdown query: one row per intersecting forest parcel, carrying
/// both grouping keys (`code_tfv`, `essence1`) and the per-parcel
/// intersected area, so both breakdowns can be built from a single fetch.
///
/// Binds a single parameter: the GeoJSON polygon literal.
pub fn forest_breakdown_sql() -> &'static str {
    r#"
    SELECT
        f.code_tfv,
        f.essence1,
        ST_Area(ST_Transform(
            ST_Intersection(f.geom, ST_SetSRID(ST_GeomFromGeoJSON($1), 4326)),
            2154
        )) AS intersected_area_m2
    FROM forest_parcels f
    WHERE ST_Intersects(f.geom, ST_SetSRID(ST_GeomFromGeoJSON($1), 4326))
    "#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_tile_sql_interpolates_only_the_matched_table() {
        let sql = admin_tile_sql(AdminLayer::Regions);
        assert!(sql.contains("admin_regions"));
        assert!(sql.contains("'regions'"));
        assert!(sql.contains("$1"));
        assert!(sql.contains("$6"));
    }

    #[test]
    fn forest_queries_bind_the_polygon_positionally() {
        assert!(forest_summary_sql().contains("$1"));
        assert!(!forest_summary_sql().contains("{}"));
        assert!(forest_breakdown_sql().contains("$1"));
    }
}
