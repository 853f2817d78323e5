//! Tile store capability and the in-memory reference store.

use std::collections::HashMap;

use bytes::Bytes;
use tracing::debug;

use raster_common::{
    BoundingBox, Coverage, PyramidLevel, RasterError, RasterResult, RasterStatistics, TileRef,
};

/// Compressed payload halves of one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePayload {
    pub odd: Bytes,
    /// Only present when requested and stored.
    pub even: Option<Bytes>,
}

impl TilePayload {
    pub fn size_bytes(&self) -> usize {
        self.odd.len() + self.even.as_ref().map_or(0, Bytes::len)
    }
}

/// Read-only, bbox-queryable tile source.
///
/// Implementations must be shareable across threads; the compositor only
/// ever reads through a shared reference.
pub trait TileStore: Send + Sync {
    /// Coverage definition by name.
    fn coverage(&self, name: &str) -> RasterResult<Coverage>;

    /// Pyramid levels of a coverage, in any order.
    fn pyramid_levels(&self, coverage: &str) -> RasterResult<Vec<PyramidLevel>>;

    /// Tiles of `level` whose footprint intersects `bbox`, in store order.
    fn query_tiles(
        &self,
        coverage: &str,
        level: u32,
        bbox: &BoundingBox,
    ) -> RasterResult<Vec<TileRef>>;

    /// Compressed payload of a tile. The even half is only read when
    /// `want_even` is set.
    fn read_tile_payload(&self, tile_id: i64, want_even: bool) -> RasterResult<TilePayload>;

    /// Precomputed per-band statistics, if any were stored.
    fn band_statistics(&self, coverage: &str) -> RasterResult<Option<RasterStatistics>>;
}

struct CoverageEntry {
    coverage: Coverage,
    levels: Vec<PyramidLevel>,
    tiles: Vec<TileRef>,
    statistics: Option<RasterStatistics>,
}

/// In-memory tile store.
///
/// Tiles are returned by [`TileStore::query_tiles`] in insertion order.
#[derive(Default)]
pub struct MemoryTileStore {
    coverages: HashMap<String, CoverageEntry>,
    payloads: HashMap<i64, (Bytes, Option<Bytes>)>,
    next_tile_id: i64,
}

impl MemoryTileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a coverage. Names are unique.
    pub fn add_coverage(&mut self, coverage: Coverage) -> RasterResult<()> {
        let name = coverage.name().to_string();
        if self.coverages.contains_key(&name) {
            return Err(RasterError::invalid_argument(format!(
                "coverage '{}' already exists",
                name
            )));
        }
        debug!(coverage = %name, "Registered coverage");
        self.coverages.insert(
            name,
            CoverageEntry {
                coverage,
                levels: Vec::new(),
                tiles: Vec::new(),
                statistics: None,
            },
        );
        Ok(())
    }

    /// Mutable access to a coverage, for its NODATA and palette setters.
    pub fn coverage_mut(&mut self, name: &str) -> RasterResult<&mut Coverage> {
        Ok(&mut self.entry_mut(name)?.coverage)
    }

    /// Add or replace a pyramid level.
    pub fn add_level(&mut self, coverage: &str, level: PyramidLevel) -> RasterResult<()> {
        let entry = self.entry_mut(coverage)?;
        entry.levels.retain(|l| l.level != level.level);
        entry.levels.push(level);
        Ok(())
    }

    /// Store a tile and return its id.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_tile(
        &mut self,
        coverage: &str,
        level: u32,
        bbox: BoundingBox,
        width: u32,
        height: u32,
        odd: Bytes,
        even: Option<Bytes>,
    ) -> RasterResult<i64> {
        if !bbox.is_valid() {
            return Err(RasterError::invalid_argument(format!(
                "invalid tile footprint {:?}",
                bbox
            )));
        }
        let tile_id = self.next_tile_id;
        let entry = self.entry_mut(coverage)?;
        if !entry.levels.iter().any(|l| l.level == level) {
            return Err(RasterError::not_found(format!(
                "coverage '{}' has no level {}",
                coverage, level
            )));
        }
        entry.tiles.push(TileRef {
            tile_id,
            level,
            bbox,
            width,
            height,
        });
        self.payloads.insert(tile_id, (odd, even));
        self.next_tile_id += 1;
        Ok(tile_id)
    }

    pub fn set_statistics(
        &mut self,
        coverage: &str,
        statistics: RasterStatistics,
    ) -> RasterResult<()> {
        self.entry_mut(coverage)?.statistics = Some(statistics);
        Ok(())
    }

    /// Number of stored tiles across all levels of a coverage.
    pub fn tile_count(&self, coverage: &str) -> usize {
        self.coverages.get(coverage).map_or(0, |e| e.tiles.len())
    }

    fn entry(&self, name: &str) -> RasterResult<&CoverageEntry> {
        self.coverages
            .get(name)
            .ok_or_else(|| RasterError::not_found(format!("coverage '{}'", name)))
    }

    fn entry_mut(&mut self, name: &str) -> RasterResult<&mut CoverageEntry> {
        self.coverages
            .get_mut(name)
            .ok_or_else(|| RasterError::not_found(format!("coverage '{}'", name)))
    }
}

impl TileStore for MemoryTileStore {
    fn coverage(&self, name: &str) -> RasterResult<Coverage> {
        Ok(self.entry(name)?.coverage.clone())
    }

    fn pyramid_levels(&self, coverage: &str) -> RasterResult<Vec<PyramidLevel>> {
        Ok(self.entry(coverage)?.levels.clone())
    }

    fn query_tiles(
        &self,
        coverage: &str,
        level: u32,
        bbox: &BoundingBox,
    ) -> RasterResult<Vec<TileRef>> {
        let tiles: Vec<TileRef> = self
            .entry(coverage)?
            .tiles
            .iter()
            .filter(|t| t.level == level && t.bbox.intersects(bbox))
            .cloned()
            .collect();
        debug!(coverage, level, count = tiles.len(), "Queried tiles");
        Ok(tiles)
    }

    fn read_tile_payload(&self, tile_id: i64, want_even: bool) -> RasterResult<TilePayload> {
        let (odd, even) = self
            .payloads
            .get(&tile_id)
            .ok_or_else(|| RasterError::io(format!("no payload stored for tile {}", tile_id)))?;
        Ok(TilePayload {
            odd: odd.clone(),
            even: if want_even { even.clone() } else { None },
        })
    }

    fn band_statistics(&self, coverage: &str) -> RasterResult<Option<RasterStatistics>> {
        Ok(self.entry(coverage)?.statistics.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{PixelType, SampleType};

    fn store_with_tiles() -> MemoryTileStore {
        let mut store = MemoryTileStore::new();
        let coverage = Coverage::new(
            "dem",
            SampleType::Float32,
            PixelType::DataGrid,
            1,
            4,
            4,
            1.0,
            1.0,
        )
        .unwrap();
        store.add_coverage(coverage).unwrap();
        store
            .add_level("dem", PyramidLevel::from_base(0, 1.0, 1.0))
            .unwrap();
        for i in 0..3 {
            let x = i as f64 * 4.0;
            store
                .insert_tile(
                    "dem",
                    0,
                    BoundingBox::new(x, 0.0, x + 4.0, 4.0),
                    4,
                    4,
                    Bytes::from_static(b"odd"),
                    Some(Bytes::from_static(b"even")),
                )
                .unwrap();
        }
        store
    }

    #[test]
    fn test_query_keeps_insertion_order() {
        let store = store_with_tiles();
        let tiles = store
            .query_tiles("dem", 0, &BoundingBox::new(2.0, 1.0, 10.0, 3.0))
            .unwrap();
        let ids: Vec<i64> = tiles.iter().map(|t| t.tile_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_query_excludes_edge_contact() {
        let store = store_with_tiles();
        let tiles = store
            .query_tiles("dem", 0, &BoundingBox::new(12.0, 0.0, 16.0, 4.0))
            .unwrap();
        assert!(tiles.is_empty());
    }

    #[test]
    fn test_even_payload_only_on_request() {
        let store = store_with_tiles();
        assert!(store.read_tile_payload(0, false).unwrap().even.is_none());
        assert_eq!(
            store.read_tile_payload(0, true).unwrap().even,
            Some(Bytes::from_static(b"even"))
        );
        assert!(matches!(
            store.read_tile_payload(99, false),
            Err(RasterError::Io(_))
        ));
    }

    #[test]
    fn test_unknown_coverage() {
        let store = MemoryTileStore::new();
        assert!(matches!(store.coverage("nope"), Err(RasterError::NotFound(_))));
        assert!(store.pyramid_levels("nope").is_err());
    }

    #[test]
    fn test_insert_requires_level() {
        let mut store = store_with_tiles();
        let result = store.insert_tile(
            "dem",
            7,
            BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            4,
            4,
            Bytes::new(),
            None,
        );
        assert!(result.is_err());
    }
}
