//! Common types shared across the raster view workspace.
//!
//! Everything that touches pixels goes through the pixel-format model defined
//! here: a [`SampleType`] × [`PixelType`] × band-count triple restricted to a
//! fixed whitelist, with [`SampleBuffer`] carrying the samples of a whole
//! raster as a tagged union over the primitive container types.

pub mod bbox;
pub mod buffer;
pub mod coverage;
pub mod error;
pub mod pixel;
pub mod tile;

pub use bbox::BoundingBox;
pub use buffer::{RasterBuffer, Sample, SampleBuffer};
pub use coverage::{BandStatistics, Coverage, PyramidLevel, RasterStatistics, Scale};
pub use error::{RasterError, RasterResult};
pub use pixel::{check_pixel_format, Palette, Pixel, PixelType, Rgb, SampleType, SampleValue};
pub use tile::{DecodedTile, TileRef};
