//! On-disk cache for downloaded raster tiles, keyed by the tile's download
//! name. Two concurrent writers of the same key are benign but wasteful,
//! so writes are skipped once a file exists.

use std::path::PathBuf;

use tokio::fs;

use crate::error::Result;

pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        fs::read(self.path_for(key)).await.ok()
    }

    pub async fn put_if_absent(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        if fs::metadata(&path).await.is_ok() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn miss_then_hit_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());

        assert!(cache.get("tile_a").await.is_none());
        cache.put_if_absent("tile_a", b"raster-bytes").await.unwrap();
        assert_eq!(cache.get("tile_a").await.unwrap(), b"raster-bytes");
    }

    #[tokio::test]
    async fn existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());

        cache.put_if_absent("tile_a", b"first").await.unwrap();
        cache.put_if_absent("tile_a", b"second").await.unwrap();
        assert_eq!(cache.get("tile_a").await.unwrap(), b"first");
    }
}
