//! Cartographic styles for raster coverages.
//!
//! Parses the raster subset of OGC SLD/SE documents into immutable values:
//!
//! - [`RasterStyle`]: a single `RasterSymbolizer` (opacity, band selection,
//!   contrast enhancement, color map, shaded relief)
//! - [`GroupStyle`]: an ordered list of named layer/style bindings with
//!   validity tracking against a [`StyleCatalog`]
//!
//! The parser never touches raw XML syntax; it walks the generic element tree
//! produced by an [`XmlTreeProvider`].

pub mod color_map;
pub mod group;
pub mod model;
pub mod parser;
pub mod xml;

pub use color_map::{CategorizeMap, ColorMap, ColorMapEntry, InterpolateMap};
pub use group::{parse_group_style, GroupStyle, MemoryStyleCatalog, NamedLayerRef, StyleCatalog};
pub use model::{BandSelection, Channel, ContrastEnhancement, RasterStyle, ShadedRelief};
pub use parser::parse_raster_style;
pub use xml::{QuickXmlProvider, XmlElement, XmlNode, XmlTreeProvider};
