//! Tile storage capabilities for the raster view renderer.
//!
//! Provides the two narrow interfaces the compositor consumes:
//! - [`TileStore`]: bbox-queryable tile source with coverage metadata
//! - [`TileCodec`]: payload decode/encode
//!
//! plus in-process reference implementations ([`MemoryTileStore`],
//! [`DeflateTileCodec`]), an LRU payload cache and a loader that tiles a
//! full-resolution raster into a store.

pub mod cache;
pub mod codec;
pub mod loader;
pub mod store;

pub use cache::{CachedTileStore, PayloadCacheStats};
pub use codec::{DeflateTileCodec, EncodedTile, TileCodec};
pub use loader::{compute_statistics, load_coverage_raster, LoadSummary};
pub use store::{MemoryTileStore, TilePayload, TileStore};
