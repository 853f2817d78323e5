//! Parsed raster symbolizer values.

use crate::color_map::ColorMap;

/// Default SE relief factor.
pub const DEFAULT_RELIEF_FACTOR: f64 = 55.0;

/// Contrast enhancement method.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ContrastEnhancement {
    #[default]
    None,
    Normalize,
    Histogram,
    /// Gamma correction with the given gamma value.
    Gamma(f64),
}

impl ContrastEnhancement {
    pub fn is_none(&self) -> bool {
        matches!(self, ContrastEnhancement::None)
    }

    /// Gamma value; 1.0 unless this is a gamma correction.
    pub fn gamma(&self) -> f64 {
        match self {
            ContrastEnhancement::Gamma(g) => *g,
            _ => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContrastEnhancement::None => "none",
            ContrastEnhancement::Normalize => "normalize",
            ContrastEnhancement::Histogram => "histogram",
            ContrastEnhancement::Gamma(_) => "gamma",
        }
    }
}

/// One selected source band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    /// 0-based source band index.
    pub band: u8,
    pub contrast: ContrastEnhancement,
}

impl Channel {
    pub fn new(band: u8) -> Self {
        Self {
            band,
            contrast: ContrastEnhancement::None,
        }
    }

    pub fn with_contrast(mut self, contrast: ContrastEnhancement) -> Self {
        self.contrast = contrast;
        self
    }
}

/// Which source bands feed the output pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandSelection {
    /// Three source bands mapped to red, green and blue.
    Triple {
        red: Channel,
        green: Channel,
        blue: Channel,
    },
    /// A single source band rendered as gray.
    Mono { gray: Channel },
}

impl BandSelection {
    /// Selected channels in output band order.
    pub fn channels(&self) -> Vec<Channel> {
        match self {
            BandSelection::Triple { red, green, blue } => vec![*red, *green, *blue],
            BandSelection::Mono { gray } => vec![*gray],
        }
    }

    /// Highest source band index referenced.
    pub fn max_band(&self) -> u8 {
        self.channels().iter().map(|c| c.band).max().unwrap_or(0)
    }

    pub fn is_triple(&self) -> bool {
        matches!(self, BandSelection::Triple { .. })
    }

    /// Whether any channel carries its own enhancement.
    pub fn has_contrast(&self) -> bool {
        self.channels().iter().any(|c| !c.contrast.is_none())
    }
}

/// Hill-shading parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadedRelief {
    pub brightness_only: bool,
    pub relief_factor: f64,
}

impl Default for ShadedRelief {
    fn default() -> Self {
        Self {
            brightness_only: false,
            relief_factor: DEFAULT_RELIEF_FACTOR,
        }
    }
}

/// A parsed `RasterSymbolizer`.
///
/// Immutable once built; use the accessors for introspection.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStyle {
    pub(crate) name: String,
    pub(crate) title: Option<String>,
    pub(crate) abstract_text: Option<String>,
    pub(crate) opacity: f64,
    pub(crate) band_selection: Option<BandSelection>,
    pub(crate) contrast: ContrastEnhancement,
    pub(crate) color_map: Option<ColorMap>,
    pub(crate) shaded_relief: Option<ShadedRelief>,
}

impl RasterStyle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn abstract_text(&self) -> Option<&str> {
        self.abstract_text.as_deref()
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn band_selection(&self) -> Option<&BandSelection> {
        self.band_selection.as_ref()
    }

    /// Overall contrast enhancement.
    pub fn contrast_enhancement(&self) -> ContrastEnhancement {
        self.contrast
    }

    pub fn color_map(&self) -> Option<&ColorMap> {
        self.color_map.as_ref()
    }

    pub fn has_color_map(&self) -> bool {
        self.color_map.is_some()
    }

    pub fn shaded_relief(&self) -> Option<&ShadedRelief> {
        self.shaded_relief.as_ref()
    }

    pub fn has_shaded_relief(&self) -> bool {
        self.shaded_relief.is_some()
    }

    /// Whether any enhancement (overall or per channel) is requested.
    pub fn has_contrast(&self) -> bool {
        !self.contrast.is_none()
            || self
                .band_selection
                .as_ref()
                .map_or(false, BandSelection::has_contrast)
    }
}
