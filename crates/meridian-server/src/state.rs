//! Application state management
//!
//! Holds the database pool, the tile producer, the polygon analyzer, and
//! the LiDAR pipeline, all Arc-wrapped for cheap cloning into request
//! handlers.

use std::sync::Arc;

use meridian_cache::backend::memory::MemoryCache;
use meridian_db::Pool;
use meridian_lidar::{LidarConfig, LidarPipeline};
use meridian_vector_tiles::TileProducer;

use crate::config::ServerConfig;
use crate::error::ServerResult;

/// Shared application state, cloned into every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub pool: Arc<Pool>,
    pub tiles: Arc<TileProducer<MemoryCache>>,
    pub analyzer: Arc<meridian_analysis::PolygonAnalyzer>,
    pub lidar: Arc<LidarPipeline>,
}

impl AppState {
    /// Creates application state: connects the database pool, builds the
    /// in-memory single-flight tile cache, and wires up the polygon
    /// analyzer and LiDAR pipeline.
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let pool = Arc::new(Pool::new(config.database.to_pool_config()).await?);

        let cache_backend = Arc::new(MemoryCache::lru(config.cache.memory_capacity));
        let tiles = Arc::new(TileProducer::new(&pool, cache_backend));

        let analyzer = Arc::new(meridian_analysis::PolygonAnalyzer::new(&pool));

        let lidar_config =
            LidarConfig::new(config.lidar.cache_dir.clone()).with_wfs_base_url(config.lidar.wfs_base_url.clone());
        let lidar = Arc::new(LidarPipeline::new(&lidar_config));

        Ok(Self {
            config: Arc::new(config),
            pool,
            tiles,
            analyzer,
            lidar,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a reachable PostGIS database"]
    async fn test_app_state_creation() {
        let config = ServerConfig::default();
        let state = AppState::new(config).await;
        assert!(state.is_ok());
    }
}
