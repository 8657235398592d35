//! # Meridian Cache
//!
//! In-memory and on-disk caching for the Meridian GIS Platform, with a
//! single-flight layer that collapses duplicate concurrent fetches for the
//! same key into one underlying computation — the discipline the tile
//! producer relies on to avoid a stampede of identical PostGIS queries.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meridian_cache::backend::memory::MemoryCache;
//! use meridian_cache::backend::{CacheBackend, CacheOptions};
//! use bytes::Bytes;
//!
//! #[tokio::main]
//! async fn main() -> meridian_cache::CacheResult<()> {
//!     let cache = MemoryCache::lru(1000);
//!     cache.set("user:123", Bytes::from("user data"), CacheOptions::default()).await?;
//!
//!     if let Some(entry) = cache.get("user:123").await? {
//!         println!("Found: {:?}", entry.value);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod single_flight;
pub mod stats;

pub use backend::{CacheBackend, CacheEntry, CacheMetadata, CacheOptions, WritePolicy};
pub use error::{CacheError, CacheResult};
pub use single_flight::{SingleFlightCache, TileKind};
pub use stats::CacheStats;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(env!("CARGO_PKG_VERSION"), "0.1.5");
    }
}
