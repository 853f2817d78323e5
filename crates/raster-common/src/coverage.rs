//! Coverage definitions, pyramid levels and band statistics.

use serde::{Deserialize, Serialize};

use crate::error::{RasterError, RasterResult};
use crate::pixel::{check_pixel_format, Palette, Pixel, PixelType, SampleType};

/// A named raster dataset with a fixed sample/pixel/band shape.
///
/// The shape is immutable once defined; only the NODATA pixel and the
/// palette can be replaced, and both are re-validated against the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    name: String,
    sample_type: SampleType,
    pixel_type: PixelType,
    num_bands: u8,
    tile_width: u32,
    tile_height: u32,
    x_res: f64,
    y_res: f64,
    #[serde(default)]
    no_data: Option<Pixel>,
    #[serde(default)]
    palette: Option<Palette>,
}

impl Coverage {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        sample_type: SampleType,
        pixel_type: PixelType,
        num_bands: u8,
        tile_width: u32,
        tile_height: u32,
        x_res: f64,
        y_res: f64,
    ) -> RasterResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(RasterError::invalid_argument("coverage name must not be empty"));
        }
        check_pixel_format(sample_type, pixel_type, num_bands)?;
        if tile_width == 0 || tile_height == 0 {
            return Err(RasterError::invalid_argument("tile dimensions must be non-zero"));
        }
        if !(x_res > 0.0 && y_res > 0.0) {
            return Err(RasterError::invalid_argument(format!(
                "base resolution must be positive, got {}x{}",
                x_res, y_res
            )));
        }

        Ok(Self {
            name,
            sample_type,
            pixel_type,
            num_bands,
            tile_width,
            tile_height,
            x_res,
            y_res,
            no_data: None,
            palette: None,
        })
    }

    /// Load a coverage definition from JSON, re-checking its invariants.
    pub fn from_json(json: &str) -> RasterResult<Self> {
        let raw: Coverage = serde_json::from_str(json)?;
        let mut coverage = Coverage::new(
            raw.name,
            raw.sample_type,
            raw.pixel_type,
            raw.num_bands,
            raw.tile_width,
            raw.tile_height,
            raw.x_res,
            raw.y_res,
        )?;
        if let Some(no_data) = raw.no_data {
            coverage.set_no_data(Some(no_data))?;
        }
        if let Some(palette) = raw.palette {
            coverage.set_palette(palette)?;
        }
        Ok(coverage)
    }

    pub fn with_no_data(mut self, no_data: Pixel) -> RasterResult<Self> {
        self.set_no_data(Some(no_data))?;
        Ok(self)
    }

    pub fn with_palette(mut self, palette: Palette) -> RasterResult<Self> {
        self.set_palette(palette)?;
        Ok(self)
    }

    pub fn set_no_data(&mut self, no_data: Option<Pixel>) -> RasterResult<()> {
        if let Some(pixel) = &no_data {
            if !pixel.matches_format(self.sample_type, self.pixel_type, self.num_bands) {
                return Err(RasterError::invalid_argument(format!(
                    "NODATA pixel does not match coverage '{}'",
                    self.name
                )));
            }
        }
        self.no_data = no_data;
        Ok(())
    }

    pub fn set_palette(&mut self, palette: Palette) -> RasterResult<()> {
        if self.pixel_type != PixelType::Palette {
            return Err(RasterError::invalid_argument(format!(
                "coverage '{}' is not a PALETTE coverage",
                self.name
            )));
        }
        if !palette.fits(self.sample_type) {
            return Err(RasterError::invalid_argument(format!(
                "palette with {} entries does not fit {} samples",
                palette.len(),
                self.sample_type
            )));
        }
        self.palette = Some(palette);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    pub fn num_bands(&self) -> u8 {
        self.num_bands
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Base (level 0, scale 1/1) resolution.
    pub fn resolution(&self) -> (f64, f64) {
        (self.x_res, self.y_res)
    }

    pub fn no_data(&self) -> Option<&Pixel> {
        self.no_data.as_ref()
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }
}

/// Reduction factor of a pyramid slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scale {
    /// 1/1, native resolution.
    Full,
    /// 1/2
    Half,
    /// 1/4
    Quarter,
    /// 1/8
    Eighth,
}

impl Scale {
    /// All scales in slot order.
    pub const ALL: [Scale; 4] = [Scale::Full, Scale::Half, Scale::Quarter, Scale::Eighth];

    /// Denominator of the scale ratio.
    pub fn factor(&self) -> u32 {
        match self {
            Scale::Full => 1,
            Scale::Half => 2,
            Scale::Quarter => 4,
            Scale::Eighth => 8,
        }
    }

    /// Slot index inside [`PyramidLevel::resolutions`].
    pub fn slot(&self) -> usize {
        match self {
            Scale::Full => 0,
            Scale::Half => 1,
            Scale::Quarter => 2,
            Scale::Eighth => 3,
        }
    }

    /// Tile pixel count along one axis at this scale.
    ///
    /// Each halving keeps every other sample starting with the first one,
    /// so odd extents round up.
    pub fn reduce(&self, full: u32) -> u32 {
        let mut size = full;
        for _ in 0..self.slot() {
            size = (size + 1) / 2;
        }
        size
    }
}

impl std::fmt::Display for Scale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "1/{}", self.factor())
    }
}

/// One pyramid level with up to four (x_res, y_res) slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidLevel {
    pub level: u32,
    pub resolutions: [Option<(f64, f64)>; 4],
}

impl PyramidLevel {
    pub fn new(level: u32, resolutions: [Option<(f64, f64)>; 4]) -> Self {
        Self { level, resolutions }
    }

    /// A level whose four slots are successive halvings of a base resolution.
    pub fn from_base(level: u32, x_res: f64, y_res: f64) -> Self {
        let mut resolutions = [None; 4];
        for scale in Scale::ALL {
            let factor = scale.factor() as f64;
            resolutions[scale.slot()] = Some((x_res * factor, y_res * factor));
        }
        Self { level, resolutions }
    }

    pub fn resolution(&self, scale: Scale) -> Option<(f64, f64)> {
        self.resolutions[scale.slot()]
    }
}

/// Precomputed statistics for one band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandStatistics {
    pub min: f64,
    pub max: f64,
    /// 256 bins evenly spanning `[min, max]`.
    pub histogram: Vec<f64>,
}

impl BandStatistics {
    pub const HISTOGRAM_BINS: usize = 256;

    /// Bin index of a value, clamped into the histogram.
    pub fn bin(&self, value: f64) -> usize {
        let bins = self.histogram.len().max(1);
        let range = self.max - self.min;
        if range <= 0.0 || !value.is_finite() {
            return 0;
        }
        let idx = ((value - self.min) / range * bins as f64).floor();
        (idx.max(0.0) as usize).min(bins - 1)
    }
}

/// Per-band statistics for a coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterStatistics {
    pub valid_count: u64,
    pub no_data_count: u64,
    pub bands: Vec<BandStatistics>,
}

impl RasterStatistics {
    pub fn band(&self, band: u8) -> Option<&BandStatistics> {
        self.bands.get(band as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_rejects_bad_shape() {
        let result = Coverage::new("dem", SampleType::Float32, PixelType::Rgb, 3, 256, 256, 1.0, 1.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_data_must_match_shape() {
        let mut coverage =
            Coverage::new("ortho", SampleType::UInt8, PixelType::Rgb, 3, 256, 256, 0.5, 0.5)
                .unwrap();
        let gray = Pixel::from_u8(SampleType::UInt8, PixelType::Grayscale, &[0]).unwrap();
        assert!(coverage.set_no_data(Some(gray)).is_err());

        let white = Pixel::from_u8(SampleType::UInt8, PixelType::Rgb, &[255, 255, 255]).unwrap();
        assert!(coverage.set_no_data(Some(white)).is_ok());
        assert!(coverage.no_data().is_some());
    }

    #[test]
    fn test_scale_reduce() {
        assert_eq!(Scale::Full.reduce(5), 5);
        assert_eq!(Scale::Half.reduce(5), 3);
        assert_eq!(Scale::Quarter.reduce(5), 2);
        assert_eq!(Scale::Eighth.reduce(5), 1);
        assert_eq!(Scale::Eighth.reduce(256), 32);
    }

    #[test]
    fn test_pyramid_level_from_base() {
        let level = PyramidLevel::from_base(0, 10.0, 20.0);
        assert_eq!(level.resolution(Scale::Full), Some((10.0, 20.0)));
        assert_eq!(level.resolution(Scale::Eighth), Some((80.0, 160.0)));
    }

    #[test]
    fn test_coverage_json_revalidates() {
        let json = r#"{
            "name": "dem",
            "sample_type": "float32",
            "pixel_type": "datagrid",
            "num_bands": 1,
            "tile_width": 256,
            "tile_height": 256,
            "x_res": 0.001,
            "y_res": 0.001
        }"#;
        let coverage = Coverage::from_json(json).unwrap();
        assert_eq!(coverage.sample_type(), SampleType::Float32);

        let bad = json.replace("\"num_bands\": 1", "\"num_bands\": 2");
        assert!(Coverage::from_json(&bad).is_err());
    }
}
