//! Stored tile references and decoded tile rasters.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::buffer::RasterBuffer;
use crate::coverage::Scale;
use crate::pixel::Pixel;

/// Metadata of a stored tile, as returned by a bbox query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileRef {
    pub tile_id: i64,
    pub level: u32,
    /// Geographic footprint.
    pub bbox: BoundingBox,
    /// Pixel width at scale 1/1.
    pub width: u32,
    /// Pixel height at scale 1/1.
    pub height: u32,
}

impl TileRef {
    /// Expected decoded dimensions at a given scale.
    pub fn dimensions_at(&self, scale: Scale) -> (u32, u32) {
        (scale.reduce(self.width), scale.reduce(self.height))
    }
}

/// A tile payload after decoding.
#[derive(Debug, Clone)]
pub struct DecodedTile {
    pub raster: RasterBuffer,
    /// One byte per pixel, 0 = transparent.
    pub mask: Option<Vec<u8>>,
    /// NODATA pixel embedded in the payload.
    pub no_data: Option<Pixel>,
}

impl DecodedTile {
    /// Whether the pixel at a linear index is opaque according to the mask.
    pub fn is_opaque(&self, pixel_index: usize) -> bool {
        match &self.mask {
            Some(mask) => mask.get(pixel_index).map_or(false, |&m| m != 0),
            None => true,
        }
    }
}
