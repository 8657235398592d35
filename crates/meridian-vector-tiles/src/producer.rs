//! Produces MVT bytes for a [`TileRequest`], serving from the single-flight
//! cache in front of the PostGIS-backed repositories.

use std::sync::Arc;

use bytes::Bytes;
use meridian_cache::backend::CacheBackend;
use meridian_cache::{SingleFlightCache, TileKind};
use meridian_db::{AdminRepository, CadastreRepository, ForestRepository, MvtParams, Pool, TileEnvelope};

use crate::error::{Error, Result};
use crate::tile::TileRequest;

#[derive(Debug, Clone)]
struct FetchError(String);

/// Produces tiles across all three table families, sharing one single-flight
/// cache keyed by fingerprint.
pub struct TileProducer<B: CacheBackend> {
    forest: ForestRepository,
    admin: AdminRepository,
    cadastre: CadastreRepository,
    cache: SingleFlightCache<B, FetchError>,
}

impl<B> TileProducer<B>
where
    B: CacheBackend + 'static,
{
    /// Builds a producer over the given connection pool and cache backend.
    pub fn new(pool: &Pool, cache_backend: Arc<B>) -> Self {
        Self {
            forest: ForestRepository::new(pool),
            admin: AdminRepository::new(pool),
            cadastre: CadastreRepository::new(pool),
            cache: SingleFlightCache::new(cache_backend),
        }
    }

    /// Produces the MVT bytes for `request`, possibly empty when no feature
    /// intersects the tile's envelope. Empty and absent are cached
    /// identically; see [`meridian_cache::SingleFlightCache`].
    pub async fn produce(&self, request: &TileRequest) -> Result<Bytes> {
        let fingerprint = request.fingerprint();
        let envelope = TileEnvelope::from_zxy(request.z(), request.x(), request.y());
        let params = MvtParams::default();

        self.cache
            .serve(&fingerprint, request.ttl(), || async {
                tracing::debug!(%fingerprint, "tile cache miss, querying database");

                let bytes = match (request.kind(), request.admin_layer()) {
                    (TileKind::Forest, _) => self.forest.mvt_tile(envelope, params).await,
                    (TileKind::Cadastre, _) => self.cadastre.mvt_tile(envelope, params).await,
                    (TileKind::Admin, Some(layer)) => {
                        self.admin.mvt_tile(layer, envelope, params).await
                    }
                    (TileKind::Admin, None) => {
                        unreachable!("TileRequest::admin never parses without a layer")
                    }
                }
                .map_err(|e| FetchError(e.to_string()))?;

                Ok(Bytes::from(bytes.unwrap_or_default()))
            })
            .await
            .map_err(|FetchError(msg)| Error::TileQuery(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_carries_the_underlying_message() {
        let err = FetchError("connection reset".to_string());
        assert_eq!(err.0, "connection reset");
    }
}
