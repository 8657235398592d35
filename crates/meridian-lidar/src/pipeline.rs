//! `AnalyzeLidar`: bbox extraction, tile-index query, pair matching,
//! parallel fetch-and-decode, CHM computation, mosaic statistics, PNG
//! rendering, and bounds normalisation.

use std::sync::Arc;

use futures::future::try_join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::bbox::{envelope_of, normalize_bounds};
use crate::chm::{compute_chm, mosaic_statistics, ChmTile, Mosaic};
use crate::config::{LidarConfig, MAX_TILES};
use crate::disk_cache::DiskCache;
use crate::error::{LidarError, Result};
use crate::geometry::parse_polygon_or_multipolygon;
use crate::image_store::{generate_content_id, ChmImageStore};
use crate::index_client::{pair_tiles, IndexClient, TilePair};
use crate::raster_client::RasterClient;
use crate::render::render_png;

const MNS_LAYER: &str = "IGNF_LIDAR-HD_MNS_ELEV.2154";
const MNT_LAYER: &str = "IGNF_LIDAR-HD_MNT_ELEV.2154";
const RASTER_WIDTH: u32 = 1000;
const RASTER_HEIGHT: u32 = 1000;

/// The composite result of `AnalyzeLidar`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LidarResult {
    pub has_coverage: bool,
    pub message: Option<String>,
    pub min_height: Option<f64>,
    pub max_height: Option<f64>,
    pub mean_height: Option<f64>,
    pub median_height: Option<f64>,
    pub chm_image_id: Option<String>,
    pub bounds: Option<[f64; 4]>,
}

impl LidarResult {
    fn no_coverage(message: impl Into<String>) -> Self {
        Self {
            has_coverage: false,
            message: Some(message.into()),
            min_height: None,
            max_height: None,
            mean_height: None,
            median_height: None,
            chm_image_id: None,
            bounds: None,
        }
    }
}

pub struct LidarPipeline {
    index: IndexClient,
    raster: Arc<RasterClient>,
    images: ChmImageStore,
}

impl LidarPipeline {
    pub fn new(config: &LidarConfig) -> Self {
        let http = Client::new();
        let index = IndexClient::new(http.clone(), config.wfs_base_url.clone());
        let cache = DiskCache::new(config.cache_dir.clone());
        let raster = Arc::new(RasterClient::new(http, cache));
        let images = ChmImageStore::new(config.cache_dir.clone());
        Self { index, raster, images }
    }

    /// Resolves a previously rendered CHM overlay's id to its PNG path.
    pub async fn chm_image_path(&self, id: &str) -> Result<std::path::PathBuf> {
        self.images.get(id).await
    }

    pub async fn analyze(&self, geojson_text: &str) -> Result<LidarResult> {
        let geometry = parse_polygon_or_multipolygon(geojson_text)?;
        let envelope = envelope_of(&geometry)?;

        // Over-request by one so a response at exactly MAX_TILES+1 is
        // distinguishable from a response the service itself capped at
        // MAX_TILES.
        let mns = self.index.query_layer(MNS_LAYER, envelope, MAX_TILES + 1).await?;
        if mns.len() > MAX_TILES {
            tracing::debug!(tile_count = mns.len(), max = MAX_TILES, "lidar request area too large");
            return Ok(LidarResult::no_coverage(format!(
                "area too large: exceeds the {MAX_TILES}-tile cap"
            )));
        }
        if mns.is_empty() {
            tracing::debug!("no MNS tile coverage for requested area");
            return Ok(LidarResult::no_coverage("no coverage"));
        }

        let mnt = self.index.query_layer(MNT_LAYER, envelope, MAX_TILES + 1).await?;
        let pairs = pair_tiles(&mns, &mnt);
        if pairs.is_empty() {
            tracing::debug!("MNS tiles present but no matching MNT tiles");
            return Ok(LidarResult::no_coverage("MNT missing"));
        }

        let bbox_str = format!("{},{},{},{}", envelope.west, envelope.south, envelope.east, envelope.north);
        tracing::info!(pairs = pairs.len(), "fetching and computing canopy height model");
        let chm_tiles = self.fetch_and_compute(&pairs, &bbox_str).await?;

        let stats = match mosaic_statistics(&chm_tiles) {
            Mosaic::NoCanopy => {
                tracing::debug!("mosaic computed but no canopy detected");
                return Ok(LidarResult::no_coverage("no canopy detected"));
            }
            Mosaic::Stats(stats) => stats,
        };

        // Only the first tile is rendered even when a request spans several;
        // mosaicking the full set into one overlay is a known gap, not a bug.
        let representative = &chm_tiles[0];
        let png_bytes = render_png(representative)?;
        let image_id = generate_content_id();
        self.images.put(&image_id, &png_bytes).await?;

        let bounds = normalize_bounds(representative.bbox, representative.epsg, envelope);

        Ok(LidarResult {
            has_coverage: true,
            message: None,
            min_height: Some(stats.min),
            max_height: Some(stats.max),
            mean_height: Some(stats.mean),
            median_height: Some(stats.median),
            chm_image_id: Some(image_id),
            bounds: Some([bounds.west, bounds.south, bounds.east, bounds.north]),
        })
    }

    /// Runs the two fetch-and-decode futures for every pair concurrently,
    /// polled as children of this call rather than spawned: if the caller
    /// drops this future (client disconnect, timeout), every in-flight
    /// raster download is dropped and stops with it instead of running on
    /// detached from the request. CHM computation for a pair only begins
    /// once both its rasters have decoded successfully, and any failure
    /// fails the whole request.
    async fn fetch_and_compute(&self, pairs: &[TilePair], bbox: &str) -> Result<Vec<ChmTile>> {
        let tasks = pairs.iter().map(|pair| async move {
            let (mns, mnt) = tokio::try_join!(
                self.raster.fetch_and_decode(&pair.mns, bbox, RASTER_WIDTH, RASTER_HEIGHT),
                self.raster.fetch_and_decode(&pair.mnt, bbox, RASTER_WIDTH, RASTER_HEIGHT),
            )?;
            Ok::<ChmTile, LidarError>(compute_chm(&mns, &mnt))
        });

        try_join_all(tasks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_coverage_result_carries_a_message_and_no_stats() {
        let result = LidarResult::no_coverage("no coverage");
        assert!(!result.has_coverage);
        assert_eq!(result.message.as_deref(), Some("no coverage"));
        assert!(result.min_height.is_none());
        assert!(result.chm_image_id.is_none());
    }
}
