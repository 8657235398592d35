//! Client for the external WFS-style tile-index service, plus the
//! grid-key pair matching that links an MNS tile to its MNT counterpart.

use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;

use crate::bbox::Envelope;
use crate::error::{LidarError, Result};

/// One indexed raster tile as returned by the tile-index service.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexedTile {
    pub name: String,
    /// Base URL of the WMS-style endpoint this tile is requested from.
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: TileProperties,
}

#[derive(Debug, Deserialize)]
struct TileProperties {
    name: String,
    url: String,
}

pub struct IndexClient {
    http: Client,
    base_url: String,
}

impl IndexClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self { http, base_url: base_url.into() }
    }

    /// Requests a feature collection for `layer`, bounded by `envelope`
    /// and capped at `count` features.
    pub async fn query_layer(&self, layer: &str, envelope: Envelope, count: usize) -> Result<Vec<IndexedTile>> {
        let bbox = format!("{},{},{},{}", envelope.west, envelope.south, envelope.east, envelope.north);
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("service", "WFS"),
                ("request", "GetFeature"),
                ("typename", layer),
                ("outputFormat", "application/json"),
                ("bbox", bbox.as_str()),
                ("count", &count.to_string()),
            ])
            .send()
            .await
            .map_err(|e| LidarError::upstream(e.to_string()))?;

        if !response.status().is_success() {
            tracing::warn!(layer, status = %response.status(), "tile index request failed");
            return Err(LidarError::upstream(format!("tile index returned status {}", response.status())));
        }

        let collection: FeatureCollection = response
            .json()
            .await
            .map_err(|e| LidarError::upstream(format!("malformed tile index response: {e}")))?;

        Ok(collection
            .features
            .into_iter()
            .map(|f| IndexedTile { name: f.properties.name, url: f.properties.url })
            .collect())
    }
}

/// Extracts the pairing grid-key from a tile name: fields 3 and 4 of an
/// underscore-separated name.
pub fn grid_key(name: &str) -> Option<(String, String)> {
    let fields: Vec<&str> = name.split('_').collect();
    if fields.len() < 4 {
        return None;
    }
    Some((fields[2].to_string(), fields[3].to_string()))
}

#[derive(Debug, Clone)]
pub struct TilePair {
    pub mns: IndexedTile,
    pub mnt: IndexedTile,
}

/// Pairs MNS tiles to MNT tiles by equal grid-key. Tiles with no grid-key,
/// or whose counterpart is missing, are dropped.
pub fn pair_tiles(mns: &[IndexedTile], mnt: &[IndexedTile]) -> Vec<TilePair> {
    let mnt_by_key: HashMap<(String, String), &IndexedTile> =
        mnt.iter().filter_map(|t| grid_key(&t.name).map(|key| (key, t))).collect();

    mns.iter()
        .filter_map(|m| {
            let key = grid_key(&m.name)?;
            mnt_by_key.get(&key).map(|mnt| TilePair { mns: m.clone(), mnt: (*mnt).clone() })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(name: &str) -> IndexedTile {
        IndexedTile { name: name.to_string(), url: "https://example.test/raster".to_string() }
    }

    #[test]
    fn grid_key_reads_the_third_and_fourth_underscore_fields() {
        assert_eq!(grid_key("LIDARHD_MNS_0950_6520_LA93"), Some(("0950".to_string(), "6520".to_string())));
    }

    #[test]
    fn short_names_have_no_grid_key() {
        assert_eq!(grid_key("a_b"), None);
    }

    #[test]
    fn pairs_tiles_with_matching_grid_keys_and_drops_the_rest() {
        let mns = vec![tile("LIDARHD_MNS_0950_6520_LA93"), tile("LIDARHD_MNS_0951_6520_LA93")];
        let mnt = vec![tile("LIDARHD_MNT_0950_6520_LA93")];

        let pairs = pair_tiles(&mns, &mnt);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].mns.name, "LIDARHD_MNS_0950_6520_LA93");
        assert_eq!(pairs[0].mnt.name, "LIDARHD_MNT_0950_6520_LA93");
    }
}
