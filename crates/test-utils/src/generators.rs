//! Synthetic rasters with predictable, verifiable values.

use raster_common::{PixelType, RasterBuffer, SampleBuffer, SampleType};

/// Multiband u16 raster where each sample is `band * 10000 + row * width + col`.
///
/// Makes it easy to check that band selection reads the right band from the
/// right pixel.
///
/// # Example
///
/// ```
/// use test_utils::create_multiband_u16;
///
/// let raster = create_multiband_u16(4, 2, 3);
/// assert_eq!(raster.value_f64(1, 1, 2), Some(20005.0));
/// ```
pub fn create_multiband_u16(width: u32, height: u32, bands: u8) -> RasterBuffer {
    let mut data = Vec::with_capacity((width * height) as usize * bands as usize);
    for row in 0..height {
        for col in 0..width {
            for band in 0..bands as u32 {
                data.push((band * 10000 + row * width + col) as u16);
            }
        }
    }
    let pixel_type = if bands == 3 {
        PixelType::Rgb
    } else {
        PixelType::Multiband
    };
    RasterBuffer::new(
        width,
        height,
        SampleType::UInt16,
        pixel_type,
        bands,
        SampleBuffer::UInt16(data),
    )
    .expect("valid multiband raster")
}

/// Multiband u8 raster where each sample is `(band * 50 + row + col) % 256`.
pub fn create_multiband_u8(width: u32, height: u32, bands: u8) -> RasterBuffer {
    let mut data = Vec::with_capacity((width * height) as usize * bands as usize);
    for row in 0..height {
        for col in 0..width {
            for band in 0..bands as u32 {
                data.push(((band * 50 + row + col) % 256) as u8);
            }
        }
    }
    let pixel_type = if bands == 3 {
        PixelType::Rgb
    } else {
        PixelType::Multiband
    };
    RasterBuffer::new(
        width,
        height,
        SampleType::UInt8,
        pixel_type,
        bands,
        SampleBuffer::UInt8(data),
    )
    .expect("valid multiband raster")
}

/// Single-band f32 grid filled by `f(col, row)`.
pub fn create_f32_grid<F>(width: u32, height: u32, f: F) -> RasterBuffer
where
    F: Fn(u32, u32) -> f32,
{
    let mut data = Vec::with_capacity((width * height) as usize);
    for row in 0..height {
        for col in 0..width {
            data.push(f(col, row));
        }
    }
    RasterBuffer::new(
        width,
        height,
        SampleType::Float32,
        PixelType::DataGrid,
        1,
        SampleBuffer::Float32(data),
    )
    .expect("valid datagrid raster")
}

/// Elevation grid at a constant height.
pub fn create_flat_dem(width: u32, height: u32, elevation: f32) -> RasterBuffer {
    create_f32_grid(width, height, |_, _| elevation)
}

/// Elevation rising linearly eastwards by `slope` per pixel.
pub fn create_east_slope_dem(width: u32, height: u32, slope: f32) -> RasterBuffer {
    create_f32_grid(width, height, |col, _| col as f32 * slope)
}

/// Grid with values `row * width + col`, useful for colormap tests.
pub fn create_index_grid(width: u32, height: u32) -> RasterBuffer {
    create_f32_grid(width, height, |col, row| (row * width + col) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiband_u16_values() {
        let raster = create_multiband_u16(3, 2, 4);
        assert_eq!(raster.value_f64(0, 0, 0), Some(0.0));
        assert_eq!(raster.value_f64(2, 1, 3), Some(30005.0));
        assert_eq!(raster.pixel_type(), PixelType::Multiband);
    }

    #[test]
    fn test_three_band_generators_are_rgb() {
        assert_eq!(create_multiband_u8(2, 2, 3).pixel_type(), PixelType::Rgb);
        assert_eq!(create_multiband_u16(2, 2, 3).pixel_type(), PixelType::Rgb);
    }

    #[test]
    fn test_east_slope() {
        let dem = create_east_slope_dem(4, 4, 2.0);
        assert_eq!(dem.value_f64(3, 0, 0), Some(6.0));
        assert_eq!(dem.value_f64(3, 3, 0), Some(6.0));
    }
}
