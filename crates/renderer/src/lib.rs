//! View rendering over tiled raster coverages.
//!
//! A [`Renderer`] turns a [`ViewRequest`] (coverage, extent, output size and
//! an optional style) into a [`raster_common::RasterBuffer`]:
//! - pyramid level and scale are matched to the requested resolution
//! - tiles intersecting the extent are decoded and painted by pixel centre
//! - styles select bands, enhance contrast, apply color maps or palettes
//! - shaded relief modulates the result or draws brightness on its own
//!
//! Independent views can be rendered in parallel with
//! [`Renderer::render_batch`].

pub mod batch;
pub mod compositor;
pub mod config;
pub mod enhance;
pub mod output;
pub mod prime;
pub mod relief;
pub mod resolution;
pub mod select;

pub use compositor::{resolve_output_format, Renderer, ViewRequest};
pub use config::RenderConfig;
pub use enhance::{gamma_correct, ChannelEnhancer};
pub use output::{OutputFormat, RenderMode, RenderPlan};
pub use prime::prime_buffer;
pub use relief::{apply_shade, shade_coefficients, write_brightness, UNSHADED};
pub use resolution::{match_resolution, ResolutionMatch, RESOLUTION_TOLERANCE};
