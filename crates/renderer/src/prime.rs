//! Output buffer priming.

use tracing::trace;

use raster_common::{
    Pixel, PixelType, RasterBuffer, RasterResult, Sample, SampleBuffer, SampleType, SampleValue,
};

/// Allocate an output buffer and fill every pixel with the background.
///
/// The background is `fill` when it has exactly the buffer's sample type and
/// band count (and, for PALETTE buffers, is itself a PALETTE pixel);
/// otherwise every sample is zero.
pub fn prime_buffer(
    width: u32,
    height: u32,
    sample_type: SampleType,
    pixel_type: PixelType,
    num_bands: u8,
    fill: Option<&Pixel>,
) -> RasterResult<RasterBuffer> {
    let mut buffer = RasterBuffer::zeroed(width, height, sample_type, pixel_type, num_bands)?;

    let pattern = fill.filter(|p| {
        p.sample_type() == sample_type
            && p.band_count() == num_bands
            && (pixel_type != PixelType::Palette || p.pixel_type() == PixelType::Palette)
    });

    if let Some(pixel) = pattern {
        fill_pattern(buffer.samples_mut(), pixel.samples());
        trace!(width, height, %sample_type, %pixel_type, "Primed buffer with fill pixel");
    }
    Ok(buffer)
}

fn fill_typed<T: Sample>(samples: &mut SampleBuffer, pattern: &[SampleValue]) {
    let Some(pattern) = pattern
        .iter()
        .map(|&v| T::from_value(v))
        .collect::<Option<Vec<T>>>()
    else {
        return;
    };
    if let Some(slice) = T::slice_mut(samples) {
        for pixel in slice.chunks_exact_mut(pattern.len()) {
            pixel.copy_from_slice(&pattern);
        }
    }
}

/// Repeat a per-pixel sample pattern over the whole buffer.
pub(crate) fn fill_pattern(samples: &mut SampleBuffer, pattern: &[SampleValue]) {
    if pattern.is_empty() {
        return;
    }
    match samples.container_type() {
        SampleType::Int8 => fill_typed::<i8>(samples, pattern),
        SampleType::Int16 => fill_typed::<i16>(samples, pattern),
        SampleType::UInt16 => fill_typed::<u16>(samples, pattern),
        SampleType::Int32 => fill_typed::<i32>(samples, pattern),
        SampleType::UInt32 => fill_typed::<u32>(samples, pattern),
        SampleType::Float32 => fill_typed::<f32>(samples, pattern),
        SampleType::Float64 => fill_typed::<f64>(samples, pattern),
        _ => fill_typed::<u8>(samples, pattern),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::RasterError;

    #[test]
    fn test_datagrid_fill() {
        let fill = Pixel::datagrid(SampleValue::Float32(-9999.0)).unwrap();
        let buffer =
            prime_buffer(3, 2, SampleType::Float32, PixelType::DataGrid, 1, Some(&fill)).unwrap();
        assert!(buffer.typed::<f32>().unwrap().iter().all(|&v| v == -9999.0));
    }

    #[test]
    fn test_rgb_fill() {
        let fill = Pixel::from_u8(SampleType::UInt8, PixelType::Rgb, &[10, 20, 30]).unwrap();
        let buffer = prime_buffer(2, 2, SampleType::UInt8, PixelType::Rgb, 3, Some(&fill)).unwrap();
        assert_eq!(
            buffer.typed::<u8>().unwrap(),
            &[10, 20, 30, 10, 20, 30, 10, 20, 30, 10, 20, 30]
        );
    }

    #[test]
    fn test_mismatched_fill_zeroes() {
        let fill = Pixel::from_u16(PixelType::Rgb, &[1, 2, 3]).unwrap();
        let buffer = prime_buffer(2, 1, SampleType::UInt8, PixelType::Rgb, 3, Some(&fill)).unwrap();
        assert!(buffer.typed::<u8>().unwrap().iter().all(|&v| v == 0));

        let fill = Pixel::from_u16(PixelType::Multiband, &[1, 2, 3, 4]).unwrap();
        let buffer =
            prime_buffer(1, 1, SampleType::UInt16, PixelType::Multiband, 5, Some(&fill)).unwrap();
        assert!(buffer.typed::<u16>().unwrap().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_palette_needs_palette_fill() {
        let gray = Pixel::from_u8(SampleType::Bit4, PixelType::Grayscale, &[7]).unwrap();
        let buffer = prime_buffer(2, 1, SampleType::Bit4, PixelType::Palette, 1, Some(&gray)).unwrap();
        assert_eq!(buffer.typed::<u8>().unwrap(), &[0, 0]);

        let index = Pixel::from_u8(SampleType::Bit4, PixelType::Palette, &[7]).unwrap();
        let buffer =
            prime_buffer(2, 1, SampleType::Bit4, PixelType::Palette, 1, Some(&index)).unwrap();
        assert_eq!(buffer.typed::<u8>().unwrap(), &[7, 7]);
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(matches!(
            prime_buffer(0, 4, SampleType::UInt8, PixelType::Grayscale, 1, None),
            Err(RasterError::InvalidArgument(_))
        ));
        assert!(matches!(
            prime_buffer(4, 4, SampleType::Float32, PixelType::Rgb, 3, None),
            Err(RasterError::InvalidArgument(_))
        ));
    }
}
