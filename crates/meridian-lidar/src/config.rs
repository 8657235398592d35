//! Runtime configuration for the LiDAR pipeline.

use std::path::PathBuf;

/// Default base URL of the external WFS tile-index service.
pub const DEFAULT_WFS_BASE_URL: &str = "https://data.geopf.fr/wfs/ows";

/// Hard ceiling on the number of tiles a single request may cover.
pub const MAX_TILES: usize = 25;

#[derive(Debug, Clone)]
pub struct LidarConfig {
    pub wfs_base_url: String,
    pub cache_dir: PathBuf,
}

impl LidarConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self { wfs_base_url: DEFAULT_WFS_BASE_URL.to_string(), cache_dir: cache_dir.into() }
    }

    pub fn with_wfs_base_url(mut self, url: impl Into<String>) -> Self {
        self.wfs_base_url = url.into();
        self
    }
}
