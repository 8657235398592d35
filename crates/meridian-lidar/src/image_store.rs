//! Filesystem-backed store for rendered CHM PNG overlays. Lifecycle is
//! externally managed: operators sweep the directory, the store itself
//! never evicts.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs;

use crate::error::{LidarError, Result};

/// Generates a collision-free-in-practice content id for a freshly
/// rendered CHM overlay.
pub fn generate_content_id() -> String {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    format!("chm_{nanos}")
}

pub struct ChmImageStore {
    root: PathBuf,
}

impl ChmImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.png"))
    }

    pub async fn put(&self, id: &str, png_bytes: &[u8]) -> Result<()> {
        let path = self.path_for(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, png_bytes).await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<PathBuf> {
        let path = self.path_for(id);
        if fs::metadata(&path).await.is_ok() {
            Ok(path)
        } else {
            Err(LidarError::not_found(format!("no CHM image with id {id}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_id_carries_the_chm_prefix() {
        assert!(generate_content_id().starts_with("chm_"));
    }

    #[tokio::test]
    async fn put_then_get_resolves_to_a_png_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChmImageStore::new(dir.path());
        store.put("chm_1", b"\x89PNG").await.unwrap();
        let path = store.get("chm_1").await.unwrap();
        assert!(path.ends_with("chm_1.png"));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChmImageStore::new(dir.path());
        assert!(matches!(store.get("missing").await, Err(LidarError::NotFound(_))));
    }
}
