//! Pixel-format model: sample types, pixel types and single-pixel values.

use serde::{Deserialize, Serialize};

use crate::buffer::Sample;
use crate::error::{RasterError, RasterResult};

/// Storage type of a single band sample.
///
/// Sub-byte types (1/2/4-bit) are held in `u8` containers everywhere a
/// buffer is materialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleType {
    #[serde(rename = "1-bit")]
    Bit1,
    #[serde(rename = "2-bit")]
    Bit2,
    #[serde(rename = "4-bit")]
    Bit4,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl SampleType {
    /// The primitive type used to hold samples of this type in memory.
    pub fn container(&self) -> SampleType {
        match self {
            SampleType::Bit1 | SampleType::Bit2 | SampleType::Bit4 => SampleType::UInt8,
            other => *other,
        }
    }

    /// Whether this is a 1/2/4-bit type.
    pub fn is_sub_byte(&self) -> bool {
        matches!(self, SampleType::Bit1 | SampleType::Bit2 | SampleType::Bit4)
    }

    /// Largest legal value of a sub-byte sample.
    pub fn sub_byte_max(&self) -> Option<u8> {
        match self {
            SampleType::Bit1 => Some(1),
            SampleType::Bit2 => Some(3),
            SampleType::Bit4 => Some(15),
            _ => None,
        }
    }

    /// Size of one in-memory sample in bytes.
    pub fn bytes_per_sample(&self) -> usize {
        match self.container() {
            SampleType::Int8 | SampleType::UInt8 => 1,
            SampleType::Int16 | SampleType::UInt16 => 2,
            SampleType::Int32 | SampleType::UInt32 | SampleType::Float32 => 4,
            _ => 8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SampleType::Bit1 => "1-bit",
            SampleType::Bit2 => "2-bit",
            SampleType::Bit4 => "4-bit",
            SampleType::Int8 => "int8",
            SampleType::UInt8 => "uint8",
            SampleType::Int16 => "int16",
            SampleType::UInt16 => "uint16",
            SampleType::Int32 => "int32",
            SampleType::UInt32 => "uint32",
            SampleType::Float32 => "float32",
            SampleType::Float64 => "float64",
        }
    }

    /// Stable numeric code, used by the reference tile codec header.
    pub fn code(&self) -> u8 {
        match self {
            SampleType::Bit1 => 1,
            SampleType::Bit2 => 2,
            SampleType::Bit4 => 3,
            SampleType::Int8 => 4,
            SampleType::UInt8 => 5,
            SampleType::Int16 => 6,
            SampleType::UInt16 => 7,
            SampleType::Int32 => 8,
            SampleType::UInt32 => 9,
            SampleType::Float32 => 10,
            SampleType::Float64 => 11,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => SampleType::Bit1,
            2 => SampleType::Bit2,
            3 => SampleType::Bit4,
            4 => SampleType::Int8,
            5 => SampleType::UInt8,
            6 => SampleType::Int16,
            7 => SampleType::UInt16,
            8 => SampleType::Int32,
            9 => SampleType::UInt32,
            10 => SampleType::Float32,
            11 => SampleType::Float64,
            _ => return None,
        })
    }
}

impl std::fmt::Display for SampleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the bands of a pixel are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelType {
    Monochrome,
    Palette,
    Grayscale,
    Rgb,
    Multiband,
    DataGrid,
}

impl PixelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PixelType::Monochrome => "monochrome",
            PixelType::Palette => "palette",
            PixelType::Grayscale => "grayscale",
            PixelType::Rgb => "rgb",
            PixelType::Multiband => "multiband",
            PixelType::DataGrid => "datagrid",
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            PixelType::Monochrome => 1,
            PixelType::Palette => 2,
            PixelType::Grayscale => 3,
            PixelType::Rgb => 4,
            PixelType::Multiband => 5,
            PixelType::DataGrid => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => PixelType::Monochrome,
            2 => PixelType::Palette,
            3 => PixelType::Grayscale,
            4 => PixelType::Rgb,
            5 => PixelType::Multiband,
            6 => PixelType::DataGrid,
            _ => return None,
        })
    }
}

impl std::fmt::Display for PixelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validate a sample/pixel/band triple against the supported whitelist.
pub fn check_pixel_format(
    sample_type: SampleType,
    pixel_type: PixelType,
    num_bands: u8,
) -> RasterResult<()> {
    use SampleType::*;

    let ok = match pixel_type {
        PixelType::Monochrome => sample_type == Bit1 && num_bands == 1,
        PixelType::Palette => matches!(sample_type, Bit1 | Bit2 | Bit4 | UInt8) && num_bands == 1,
        PixelType::Grayscale => matches!(sample_type, Bit2 | Bit4 | UInt8) && num_bands == 1,
        PixelType::Rgb => matches!(sample_type, UInt8 | UInt16) && num_bands == 3,
        PixelType::Multiband => matches!(sample_type, UInt8 | UInt16) && num_bands >= 2,
        PixelType::DataGrid => {
            matches!(
                sample_type,
                Int8 | UInt8 | Int16 | UInt16 | Int32 | UInt32 | Float32 | Float64
            ) && num_bands == 1
        }
    };

    if ok {
        Ok(())
    } else {
        Err(RasterError::invalid_argument(format!(
            "unsupported pixel format: {} {} with {} band(s)",
            sample_type, pixel_type, num_bands
        )))
    }
}

/// One band sample, tagged with its container type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SampleValue {
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Float32(f32),
    Float64(f64),
}

impl SampleValue {
    /// The container type this value belongs to.
    pub fn container_type(&self) -> SampleType {
        match self {
            SampleValue::Int8(_) => SampleType::Int8,
            SampleValue::UInt8(_) => SampleType::UInt8,
            SampleValue::Int16(_) => SampleType::Int16,
            SampleValue::UInt16(_) => SampleType::UInt16,
            SampleValue::Int32(_) => SampleType::Int32,
            SampleValue::UInt32(_) => SampleType::UInt32,
            SampleValue::Float32(_) => SampleType::Float32,
            SampleValue::Float64(_) => SampleType::Float64,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            SampleValue::Int8(v) => v as f64,
            SampleValue::UInt8(v) => v as f64,
            SampleValue::Int16(v) => v as f64,
            SampleValue::UInt16(v) => v as f64,
            SampleValue::Int32(v) => v as f64,
            SampleValue::UInt32(v) => v as f64,
            SampleValue::Float32(v) => v as f64,
            SampleValue::Float64(v) => v,
        }
    }
}

/// An RGB display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a literal `#RRGGBB` color. No other notation is accepted.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Self { r, g, b })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Color lookup table for PALETTE coverages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    entries: Vec<Rgb>,
}

impl Palette {
    pub fn new(entries: Vec<Rgb>) -> RasterResult<Self> {
        if entries.is_empty() || entries.len() > 256 {
            return Err(RasterError::invalid_argument(format!(
                "palette must hold 1..=256 entries, got {}",
                entries.len()
            )));
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Rgb] {
        &self.entries
    }

    /// Look up an index; out-of-range indices resolve to black.
    pub fn color(&self, index: u8) -> Rgb {
        self.entries
            .get(index as usize)
            .copied()
            .unwrap_or(Rgb::BLACK)
    }

    /// Whether the palette fits the index range of a sample type.
    pub fn fits(&self, sample_type: SampleType) -> bool {
        match sample_type.sub_byte_max() {
            Some(max) => self.entries.len() <= max as usize + 1,
            None => sample_type == SampleType::UInt8,
        }
    }
}

/// A single pixel: one sample per band in a fixed format.
///
/// Used for NODATA values and buffer fill values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pixel {
    sample_type: SampleType,
    pixel_type: PixelType,
    samples: Vec<SampleValue>,
}

impl Pixel {
    pub fn new(
        sample_type: SampleType,
        pixel_type: PixelType,
        samples: Vec<SampleValue>,
    ) -> RasterResult<Self> {
        let num_bands = u8::try_from(samples.len())
            .map_err(|_| RasterError::invalid_argument("too many bands for a pixel"))?;
        check_pixel_format(sample_type, pixel_type, num_bands)?;

        for sample in &samples {
            if sample.container_type() != sample_type.container() {
                return Err(RasterError::invalid_argument(format!(
                    "sample {:?} does not fit a {} pixel",
                    sample, sample_type
                )));
            }
            if let (Some(max), SampleValue::UInt8(v)) = (sample_type.sub_byte_max(), sample) {
                if *v > max {
                    return Err(RasterError::invalid_argument(format!(
                        "sample {} out of range for {}",
                        v, sample_type
                    )));
                }
            }
        }

        Ok(Self {
            sample_type,
            pixel_type,
            samples,
        })
    }

    /// Convenience constructor for 8-bit container pixels (including sub-byte types).
    pub fn from_u8(sample_type: SampleType, pixel_type: PixelType, bands: &[u8]) -> RasterResult<Self> {
        Self::new(
            sample_type,
            pixel_type,
            bands.iter().map(|&v| SampleValue::UInt8(v)).collect(),
        )
    }

    /// Convenience constructor for 16-bit unsigned pixels.
    pub fn from_u16(pixel_type: PixelType, bands: &[u16]) -> RasterResult<Self> {
        Self::new(
            SampleType::UInt16,
            pixel_type,
            bands.iter().map(|&v| SampleValue::UInt16(v)).collect(),
        )
    }

    /// A single-band DATAGRID pixel.
    pub fn datagrid(value: SampleValue) -> RasterResult<Self> {
        Self::new(value.container_type(), PixelType::DataGrid, vec![value])
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    pub fn band_count(&self) -> u8 {
        self.samples.len() as u8
    }

    pub fn samples(&self) -> &[SampleValue] {
        &self.samples
    }

    pub fn sample(&self, band: usize) -> Option<SampleValue> {
        self.samples.get(band).copied()
    }

    /// All samples as a typed vector; `None` when `T` is not the container type.
    pub fn typed<T: Sample>(&self) -> Option<Vec<T>> {
        self.samples.iter().map(|&v| T::from_value(v)).collect()
    }

    /// All samples widened to f64.
    pub fn to_f64(&self) -> Vec<f64> {
        self.samples.iter().map(SampleValue::as_f64).collect()
    }

    /// Whether this pixel has exactly the given shape.
    pub fn matches_format(
        &self,
        sample_type: SampleType,
        pixel_type: PixelType,
        num_bands: u8,
    ) -> bool {
        self.sample_type == sample_type
            && self.pixel_type == pixel_type
            && self.band_count() == num_bands
    }
}
