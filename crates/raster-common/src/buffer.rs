//! Raster sample buffers.
//!
//! [`SampleBuffer`] is a tagged union over the primitive container types, so
//! per-type pixel loops are selected with a single `match` instead of casting
//! untyped memory. Generic loops bound on [`Sample`] borrow the typed slice
//! back out of the union.

use num_traits::{Bounded, NumCast, ToPrimitive};

use crate::error::{RasterError, RasterResult};
use crate::pixel::{check_pixel_format, Pixel, PixelType, SampleType, SampleValue};

/// Samples of a whole raster, band-interleaved (pixel-major) order.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl SampleBuffer {
    /// A zero-filled buffer holding `len` samples of the given type.
    pub fn zeroed(sample_type: SampleType, len: usize) -> Self {
        match sample_type.container() {
            SampleType::Int8 => SampleBuffer::Int8(vec![0; len]),
            SampleType::Int16 => SampleBuffer::Int16(vec![0; len]),
            SampleType::UInt16 => SampleBuffer::UInt16(vec![0; len]),
            SampleType::Int32 => SampleBuffer::Int32(vec![0; len]),
            SampleType::UInt32 => SampleBuffer::UInt32(vec![0; len]),
            SampleType::Float32 => SampleBuffer::Float32(vec![0.0; len]),
            SampleType::Float64 => SampleBuffer::Float64(vec![0.0; len]),
            _ => SampleBuffer::UInt8(vec![0; len]),
        }
    }

    /// Container type of the samples.
    pub fn container_type(&self) -> SampleType {
        match self {
            SampleBuffer::Int8(_) => SampleType::Int8,
            SampleBuffer::UInt8(_) => SampleType::UInt8,
            SampleBuffer::Int16(_) => SampleType::Int16,
            SampleBuffer::UInt16(_) => SampleType::UInt16,
            SampleBuffer::Int32(_) => SampleType::Int32,
            SampleBuffer::UInt32(_) => SampleType::UInt32,
            SampleBuffer::Float32(_) => SampleType::Float32,
            SampleBuffer::Float64(_) => SampleType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::Int8(v) => v.len(),
            SampleBuffer::UInt8(v) => v.len(),
            SampleBuffer::Int16(v) => v.len(),
            SampleBuffer::UInt16(v) => v.len(),
            SampleBuffer::Int32(v) => v.len(),
            SampleBuffer::UInt32(v) => v.len(),
            SampleBuffer::Float32(v) => v.len(),
            SampleBuffer::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one sample widened to f64.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            SampleBuffer::Int8(v) => v.get(index).map(|&s| s as f64),
            SampleBuffer::UInt8(v) => v.get(index).map(|&s| s as f64),
            SampleBuffer::Int16(v) => v.get(index).map(|&s| s as f64),
            SampleBuffer::UInt16(v) => v.get(index).map(|&s| s as f64),
            SampleBuffer::Int32(v) => v.get(index).map(|&s| s as f64),
            SampleBuffer::UInt32(v) => v.get(index).map(|&s| s as f64),
            SampleBuffer::Float32(v) => v.get(index).map(|&s| s as f64),
            SampleBuffer::Float64(v) => v.get(index).copied(),
        }
    }

    /// Read one sample as a tagged value.
    pub fn get_value(&self, index: usize) -> Option<SampleValue> {
        match self {
            SampleBuffer::Int8(v) => v.get(index).map(|&s| SampleValue::Int8(s)),
            SampleBuffer::UInt8(v) => v.get(index).map(|&s| SampleValue::UInt8(s)),
            SampleBuffer::Int16(v) => v.get(index).map(|&s| SampleValue::Int16(s)),
            SampleBuffer::UInt16(v) => v.get(index).map(|&s| SampleValue::UInt16(s)),
            SampleBuffer::Int32(v) => v.get(index).map(|&s| SampleValue::Int32(s)),
            SampleBuffer::UInt32(v) => v.get(index).map(|&s| SampleValue::UInt32(s)),
            SampleBuffer::Float32(v) => v.get(index).map(|&s| SampleValue::Float32(s)),
            SampleBuffer::Float64(v) => v.get(index).map(|&s| SampleValue::Float64(s)),
        }
    }
    /// Write one tagged value; false when the index or the value type
    /// does not fit this buffer.
    pub fn set_value(&mut self, index: usize, value: SampleValue) -> bool {
        let slot = match (self, value) {
            (SampleBuffer::Int8(v), SampleValue::Int8(s)) => v.get_mut(index).map(|d| *d = s),
            (SampleBuffer::UInt8(v), SampleValue::UInt8(s)) => v.get_mut(index).map(|d| *d = s),
            (SampleBuffer::Int16(v), SampleValue::Int16(s)) => v.get_mut(index).map(|d| *d = s),
            (SampleBuffer::UInt16(v), SampleValue::UInt16(s)) => {
                v.get_mut(index).map(|d| *d = s)
            }
            (SampleBuffer::Int32(v), SampleValue::Int32(s)) => v.get_mut(index).map(|d| *d = s),
            (SampleBuffer::UInt32(v), SampleValue::UInt32(s)) => {
                v.get_mut(index).map(|d| *d = s)
            }
            (SampleBuffer::Float32(v), SampleValue::Float32(s)) => {
                v.get_mut(index).map(|d| *d = s)
            }
            (SampleBuffer::Float64(v), SampleValue::Float64(s)) => {
                v.get_mut(index).map(|d| *d = s)
            }
            _ => None,
        };
        slot.is_some()
    }
}

/// A primitive sample container type.
pub trait Sample:
    Copy + PartialEq + PartialOrd + Default + Bounded + NumCast + ToPrimitive + Send + Sync + 'static
{
    /// Container type tag of `Self`.
    const SAMPLE_TYPE: SampleType;
    /// Encoded width in bytes.
    const SIZE: usize;

    fn slice(buffer: &SampleBuffer) -> Option<&[Self]>;
    fn slice_mut(buffer: &mut SampleBuffer) -> Option<&mut [Self]>;
    fn into_buffer(samples: Vec<Self>) -> SampleBuffer;
    fn from_value(value: SampleValue) -> Option<Self>;
    fn put_le(self, out: &mut Vec<u8>);
    /// Decode from exactly `SIZE` little-endian bytes.
    fn get_le(bytes: &[u8]) -> Self;

    /// Convert from f64, saturating at the type bounds. Integer targets
    /// truncate toward zero; NaN maps to zero.
    fn saturating_from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        let lo = Self::min_value().to_f64().unwrap_or(f64::MIN);
        let hi = Self::max_value().to_f64().unwrap_or(f64::MAX);
        NumCast::from(value.clamp(lo, hi)).unwrap_or_default()
    }
}

macro_rules! impl_sample {
    ($t:ty, $variant:ident, $size:expr) => {
        impl Sample for $t {
            const SAMPLE_TYPE: SampleType = SampleType::$variant;
            const SIZE: usize = $size;

            fn slice(buffer: &SampleBuffer) -> Option<&[Self]> {
                match buffer {
                    SampleBuffer::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn slice_mut(buffer: &mut SampleBuffer) -> Option<&mut [Self]> {
                match buffer {
                    SampleBuffer::$variant(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }

            fn into_buffer(samples: Vec<Self>) -> SampleBuffer {
                SampleBuffer::$variant(samples)
            }

            fn from_value(value: SampleValue) -> Option<Self> {
                match value {
                    SampleValue::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn put_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn get_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; $size];
                raw.copy_from_slice(&bytes[..$size]);
                <$t>::from_le_bytes(raw)
            }
        }
    };
}

impl_sample!(i8, Int8, 1);
impl_sample!(u8, UInt8, 1);
impl_sample!(i16, Int16, 2);
impl_sample!(u16, UInt16, 2);
impl_sample!(i32, Int32, 4);
impl_sample!(u32, UInt32, 4);
impl_sample!(f32, Float32, 4);
impl_sample!(f64, Float64, 8);

/// A raster of `width × height` pixels in a fixed pixel format.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    sample_type: SampleType,
    pixel_type: PixelType,
    num_bands: u8,
    samples: SampleBuffer,
}

impl RasterBuffer {
    /// Wrap existing samples, validating format and length.
    pub fn new(
        width: u32,
        height: u32,
        sample_type: SampleType,
        pixel_type: PixelType,
        num_bands: u8,
        samples: SampleBuffer,
    ) -> RasterResult<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::invalid_argument(format!(
                "raster dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        check_pixel_format(sample_type, pixel_type, num_bands)?;

        if samples.container_type() != sample_type.container() {
            return Err(RasterError::invalid_argument(format!(
                "{} samples cannot back a {} raster",
                samples.container_type(),
                sample_type
            )));
        }

        let expected = width as usize * height as usize * num_bands as usize;
        if samples.len() != expected {
            return Err(RasterError::invalid_argument(format!(
                "expected {} samples for {}x{}x{}, got {}",
                expected,
                width,
                height,
                num_bands,
                samples.len()
            )));
        }

        Ok(Self {
            width,
            height,
            sample_type,
            pixel_type,
            num_bands,
            samples,
        })
    }

    /// A zero-filled raster.
    pub fn zeroed(
        width: u32,
        height: u32,
        sample_type: SampleType,
        pixel_type: PixelType,
        num_bands: u8,
    ) -> RasterResult<Self> {
        let len = width as usize * height as usize * num_bands as usize;
        Self::new(
            width,
            height,
            sample_type,
            pixel_type,
            num_bands,
            SampleBuffer::zeroed(sample_type, len),
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
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

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut SampleBuffer {
        &mut self.samples
    }

    pub fn into_samples(self) -> SampleBuffer {
        self.samples
    }

    /// Typed view of the samples; `None` when `T` is not the container type.
    pub fn typed<T: Sample>(&self) -> Option<&[T]> {
        T::slice(&self.samples)
    }

    pub fn typed_mut<T: Sample>(&mut self) -> Option<&mut [T]> {
        T::slice_mut(&mut self.samples)
    }

    /// Sample index of band 0 of the pixel at (col, row).
    pub fn offset(&self, col: u32, row: u32) -> usize {
        (row as usize * self.width as usize + col as usize) * self.num_bands as usize
    }

    /// Read a single band sample widened to f64.
    pub fn value_f64(&self, col: u32, row: u32, band: u8) -> Option<f64> {
        if col >= self.width || row >= self.height || band >= self.num_bands {
            return None;
        }
        self.samples.get_f64(self.offset(col, row) + band as usize)
    }

    /// Read the full pixel at (col, row).
    pub fn pixel(&self, col: u32, row: u32) -> Option<Pixel> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let base = self.offset(col, row);
        let samples = (0..self.num_bands as usize)
            .map(|b| self.samples.get_value(base + b))
            .collect::<Option<Vec<_>>>()?;
        Pixel::new(self.sample_type, self.pixel_type, samples).ok()
    }
}
