//! LRU cache of compressed tile payloads.
//!
//! Neighbouring views tend to hit the same tiles, so payload reads are worth
//! caching in front of a slow store. Payloads are `Bytes`, so a hit is a
//! reference-count bump rather than a copy.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use lru::LruCache;
use serde::Serialize;
use tracing::debug;

use raster_common::{
    BoundingBox, Coverage, PyramidLevel, RasterError, RasterResult, RasterStatistics, TileRef,
};

use crate::store::{TilePayload, TileStore};

/// Snapshot of cache counters.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PayloadCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl PayloadCacheStats {
    /// Hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// A [`TileStore`] wrapper that caches payload reads.
///
/// Metadata calls pass straight through to the inner store.
pub struct CachedTileStore<S> {
    inner: S,
    cache: Mutex<LruCache<(i64, bool), TilePayload>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: TileStore> CachedTileStore<S> {
    /// Wrap `inner` with room for `capacity` payloads (at least one).
    pub fn new(inner: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn stats(&self) -> PayloadCacheStats {
        PayloadCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.lock().map(|c| c.len()).unwrap_or(0),
        }
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}

impl<S: TileStore> TileStore for CachedTileStore<S> {
    fn coverage(&self, name: &str) -> RasterResult<Coverage> {
        self.inner.coverage(name)
    }

    fn pyramid_levels(&self, coverage: &str) -> RasterResult<Vec<PyramidLevel>> {
        self.inner.pyramid_levels(coverage)
    }

    fn query_tiles(
        &self,
        coverage: &str,
        level: u32,
        bbox: &BoundingBox,
    ) -> RasterResult<Vec<TileRef>> {
        self.inner.query_tiles(coverage, level, bbox)
    }

    fn read_tile_payload(&self, tile_id: i64, want_even: bool) -> RasterResult<TilePayload> {
        let key = (tile_id, want_even);
        {
            let mut cache = self
                .cache
                .lock()
                .map_err(|_| RasterError::io("payload cache lock poisoned"))?;
            if let Some(payload) = cache.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(payload.clone());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let payload = self.inner.read_tile_payload(tile_id, want_even)?;
        debug!(tile_id, want_even, bytes = payload.size_bytes(), "Cached tile payload");

        let mut cache = self
            .cache
            .lock()
            .map_err(|_| RasterError::io("payload cache lock poisoned"))?;
        cache.put(key, payload.clone());
        Ok(payload)
    }

    fn band_statistics(&self, coverage: &str) -> RasterResult<Option<RasterStatistics>> {
        self.inner.band_statistics(coverage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTileStore;
    use bytes::Bytes;
    use raster_common::{PixelType, SampleType};

    fn store() -> MemoryTileStore {
        let mut store = MemoryTileStore::new();
        store
            .add_coverage(
                Coverage::new("c", SampleType::UInt8, PixelType::Grayscale, 1, 2, 2, 1.0, 1.0)
                    .unwrap(),
            )
            .unwrap();
        store.add_level("c", PyramidLevel::from_base(0, 1.0, 1.0)).unwrap();
        for i in 0..3 {
            let x = i as f64 * 2.0;
            store
                .insert_tile(
                    "c",
                    0,
                    BoundingBox::new(x, 0.0, x + 2.0, 2.0),
                    2,
                    2,
                    Bytes::from(vec![i as u8]),
                    None,
                )
                .unwrap();
        }
        store
    }

    #[test]
    fn test_cache_hit_miss() {
        let cached = CachedTileStore::new(store(), 8);
        assert_eq!(cached.read_tile_payload(0, false).unwrap().odd, Bytes::from(vec![0]));
        assert_eq!(cached.read_tile_payload(0, false).unwrap().odd, Bytes::from(vec![0]));

        let stats = cached.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hit_rate(), 50.0);
    }

    #[test]
    fn test_lru_eviction() {
        let cached = CachedTileStore::new(store(), 2);
        for id in 0..3 {
            cached.read_tile_payload(id, false).unwrap();
        }
        assert_eq!(cached.stats().entries, 2);

        // Tile 0 was evicted and has to be read again.
        cached.read_tile_payload(0, false).unwrap();
        assert_eq!(cached.stats().misses, 4);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cached = CachedTileStore::new(store(), 2);
        assert!(cached.read_tile_payload(42, false).is_err());
        assert_eq!(cached.stats().entries, 0);
    }
}
