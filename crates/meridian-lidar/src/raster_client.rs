//! Fetches a raster tile from the WMS-style endpoint named by the tile
//! index, consulting the on-disk cache first and decoding the result via
//! the GeoTIFF reader.

use reqwest::Client;

use crate::disk_cache::DiskCache;
use crate::error::{LidarError, Result};
use crate::geotiff;
use crate::index_client::IndexedTile;
use crate::raster::Raster;

const RASTER_FORMAT: &str = "image/geotiff";
const RASTER_CRS: &str = "EPSG:2154";

pub struct RasterClient {
    http: Client,
    cache: DiskCache,
}

impl RasterClient {
    pub fn new(http: Client, cache: DiskCache) -> Self {
        Self { http, cache }
    }

    pub async fn fetch_and_decode(&self, tile: &IndexedTile, bbox: &str, width: u32, height: u32) -> Result<Raster> {
        let bytes = match self.cache.get(&tile.name).await {
            Some(bytes) => {
                tracing::debug!(tile = %tile.name, "raster disk cache hit");
                bytes
            }
            None => {
                tracing::debug!(tile = %tile.name, "raster disk cache miss, fetching from WMS endpoint");
                let url = self.build_wms_url(&tile.url, bbox, width, height)?;
                let response = self.http.get(url).send().await.map_err(|e| LidarError::upstream(e.to_string()))?;
                if !response.status().is_success() {
                    tracing::warn!(tile = %tile.name, status = %response.status(), "raster endpoint request failed");
                    return Err(LidarError::upstream(format!("raster endpoint returned status {}", response.status())));
                }
                let bytes = response.bytes().await.map_err(|e| LidarError::upstream(e.to_string()))?.to_vec();
                self.cache.put_if_absent(&tile.name, &bytes).await?;
                bytes
            }
        };

        geotiff::decode(&bytes)
    }

    fn build_wms_url(&self, base: &str, bbox: &str, width: u32, height: u32) -> Result<String> {
        let mut url = url::Url::parse(base).map_err(|e| LidarError::upstream(format!("malformed raster url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("format", RASTER_FORMAT)
            .append_pair("crs", RASTER_CRS)
            .append_pair("bbox", bbox)
            .append_pair("width", &width.to_string())
            .append_pair("height", &height.to_string());
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wms_url_carries_format_crs_bbox_and_dimensions() {
        let client = RasterClient::new(Client::new(), DiskCache::new("/tmp/meridian-lidar-test"));
        let url = client.build_wms_url("https://example.test/wms", "1,2,3,4", 512, 512).unwrap();
        assert!(url.contains("format=image%2Fgeotiff"));
        assert!(url.contains("crs=EPSG%3A2154"));
        assert!(url.contains("bbox=1%2C2%2C3%2C4"));
        assert!(url.contains("width=512"));
        assert!(url.contains("height=512"));
    }

    #[test]
    fn malformed_base_url_is_an_upstream_error() {
        let client = RasterClient::new(Client::new(), DiskCache::new("/tmp/meridian-lidar-test"));
        let err = client.build_wms_url("not a url", "1,2,3,4", 512, 512).unwrap_err();
        assert!(matches!(err, LidarError::Upstream(_)));
    }
}
