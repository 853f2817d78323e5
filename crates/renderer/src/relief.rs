//! Hill shading.
//!
//! Per-pixel light coefficients come from a 3x3 Horn neighborhood over the
//! elevation grid with the sun at azimuth 315°, altitude 45°. A coefficient
//! of `-1.0` marks pixels that cannot be shaded (border or NODATA nearby).

use std::f64::consts::FRAC_PI_2;

use tracing::debug;

use raster_common::{BoundingBox, RasterBuffer, RasterError, RasterResult, Sample};

use crate::compositor::{with_samples, Renderer};

/// Sun azimuth, degrees clockwise from north.
pub const SUN_AZIMUTH: f64 = 315.0;
/// Sun altitude above the horizon, degrees.
pub const SUN_ALTITUDE: f64 = 45.0;

/// Coefficient for pixels left unshaded.
pub const UNSHADED: f32 = -1.0;

impl Renderer<'_> {
    /// Shading coefficients for an extent rendered at `width` x `height`.
    ///
    /// The elevation is read from the coverage's best matching pyramid slot
    /// the same way a view is. Pixels equal to the coverage NODATA, or NaN,
    /// count as missing.
    pub fn shaded_relief(
        &self,
        coverage: &str,
        extent: &BoundingBox,
        width: u32,
        height: u32,
        relief_factor: f64,
        scale_factor: f64,
    ) -> RasterResult<Vec<f32>> {
        let coverage = self.store().coverage(coverage)?;
        if coverage.num_bands() != 1 {
            return Err(RasterError::invalid_argument(format!(
                "shaded relief needs a single-band coverage, '{}' has {} bands",
                coverage.name(),
                coverage.num_bands()
            )));
        }

        let grid = self.read_passthrough(&coverage, extent, width, height)?;
        let no_data = coverage.no_data().and_then(|p| p.to_f64().first().copied());
        let elevation: Vec<Option<f64>> = (0..grid.pixel_count())
            .map(|i| {
                grid.samples()
                    .get_f64(i)
                    .filter(|v| !v.is_nan() && Some(*v) != no_data)
            })
            .collect();

        let x_res = extent.width() / width as f64;
        let y_res = extent.height() / height as f64;
        let coeffs = shade_coefficients(
            &elevation,
            width as usize,
            height as usize,
            x_res,
            y_res,
            relief_factor,
            scale_factor,
        );
        debug!(
            coverage = coverage.name(),
            width,
            height,
            relief_factor,
            shaded = coeffs.iter().filter(|c| **c >= 0.0).count(),
            "Computed shaded relief"
        );
        Ok(coeffs)
    }
}

/// Horn hill-shade coefficients over a row-major elevation grid.
///
/// `None` cells are missing. The result is `UNSHADED` on the outer ring and
/// wherever the 3x3 window holds a missing cell, otherwise
/// `max(cos(incidence), 0) / sin(altitude)`, so flat ground scores 1.0.
pub fn shade_coefficients(
    elevation: &[Option<f64>],
    width: usize,
    height: usize,
    x_res: f64,
    y_res: f64,
    relief_factor: f64,
    scale_factor: f64,
) -> Vec<f32> {
    let mut out = vec![UNSHADED; width * height];
    if width < 3 || height < 3 || elevation.len() < width * height {
        return out;
    }

    let altitude = SUN_ALTITUDE.to_radians();
    let azimuth = SUN_AZIMUTH.to_radians();
    let (sin_alt, cos_alt) = altitude.sin_cos();
    let x_den = 8.0 * x_res * scale_factor;
    let y_den = 8.0 * y_res * scale_factor;

    for row in 1..height - 1 {
        for col in 1..width - 1 {
            let mut w = [0.0f64; 9];
            let mut complete = true;
            'window: for dy in 0..3 {
                for dx in 0..3 {
                    match elevation[(row + dy - 1) * width + col + dx - 1] {
                        Some(z) => w[dy * 3 + dx] = z,
                        None => {
                            complete = false;
                            break 'window;
                        }
                    }
                }
            }
            if !complete {
                continue;
            }
            let [a, b, c, d, _, f, g, h, i] = w;

            let x = ((a + 2.0 * d + g) - (c + 2.0 * f + i)) / x_den;
            let y = ((a + 2.0 * b + c) - (g + 2.0 * h + i)) / y_den;
            let slope = FRAC_PI_2 - ((x * x + y * y).sqrt() * relief_factor).atan();
            let aspect = x.atan2(y);
            let cang = sin_alt * slope.sin()
                + cos_alt * slope.cos() * (azimuth - FRAC_PI_2 - aspect).cos();

            out[row * width + col] = (cang.max(0.0) / sin_alt) as f32;
        }
    }
    out
}

/// Scale every band of each shaded pixel by its coefficient.
pub fn apply_shade(buffer: &mut RasterBuffer, coeffs: &[f32]) -> RasterResult<()> {
    check_len(buffer, coeffs)?;
    let bands = buffer.num_bands() as usize;
    with_samples!(buffer.samples_mut(), samples => shade_samples(samples, bands, coeffs));
    Ok(())
}

fn shade_samples<T: Sample>(samples: &mut [T], bands: usize, coeffs: &[f32]) {
    for (pixel, &coeff) in samples.chunks_mut(bands).zip(coeffs) {
        if coeff < 0.0 {
            continue;
        }
        for v in pixel {
            if let Some(value) = v.to_f64() {
                *v = T::saturating_from_f64(value * coeff as f64);
            }
        }
    }
}

/// Draw the coefficients as 8-bit brightness; unshaded pixels keep their
/// primed value.
pub fn write_brightness(buffer: &mut RasterBuffer, coeffs: &[f32]) -> RasterResult<()> {
    check_len(buffer, coeffs)?;
    let out = buffer
        .typed_mut::<u8>()
        .ok_or_else(|| RasterError::invalid_argument("brightness output must be uint8 gray"))?;
    for (v, &coeff) in out.iter_mut().zip(coeffs) {
        if coeff >= 0.0 {
            *v = (255.0 * coeff).clamp(0.0, 255.0) as u8;
        }
    }
    Ok(())
}

fn check_len(buffer: &RasterBuffer, coeffs: &[f32]) -> RasterResult<()> {
    if coeffs.len() != buffer.pixel_count() {
        return Err(RasterError::invalid_argument(format!(
            "{} shading coefficients for {} pixels",
            coeffs.len(),
            buffer.pixel_count()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{PixelType, SampleBuffer, SampleType};

    fn grid(width: usize, height: usize, f: impl Fn(usize, usize) -> f64) -> Vec<Option<f64>> {
        (0..height)
            .flat_map(|r| (0..width).map(move |c| (r, c)))
            .map(|(r, c)| Some(f(r, c)))
            .collect()
    }

    #[test]
    fn test_flat_is_unit_inside_and_unshaded_on_border() {
        let coeffs = shade_coefficients(&grid(4, 4, |_, _| 100.0), 4, 4, 1.0, 1.0, 1.0, 1.0);
        for row in 0..4 {
            for col in 0..4 {
                let c = coeffs[row * 4 + col];
                if row == 0 || col == 0 || row == 3 || col == 3 {
                    assert_eq!(c, UNSHADED);
                } else {
                    assert!((c - 1.0).abs() < 1e-6, "({row},{col}) = {c}");
                }
            }
        }
    }

    #[test]
    fn test_sun_facing_slope_is_brighter() {
        // Elevation falls towards the west, so slopes face the north-west sun.
        let west_facing = shade_coefficients(&grid(3, 3, |_, c| c as f64), 3, 3, 1.0, 1.0, 1.0, 1.0);
        let east_facing = shade_coefficients(&grid(3, 3, |_, c| -(c as f64)), 3, 3, 1.0, 1.0, 1.0, 1.0);
        assert!(west_facing[4] > 1.0);
        assert!(east_facing[4] < 1.0);
        assert!((west_facing[4] - 1.2071).abs() < 1e-3);
        assert!((east_facing[4] - 0.2071).abs() < 1e-3);
    }

    #[test]
    fn test_scale_factor_widens_horizontal_distance() {
        let slope = grid(3, 3, |_, c| c as f64);
        let unscaled = shade_coefficients(&slope, 3, 3, 1.0, 1.0, 1.0, 1.0)[4];
        let scaled = shade_coefficients(&slope, 3, 3, 1.0, 1.0, 1.0, 1000.0)[4];
        // Same as shrinking the relief by the factor, so nearly flat.
        let shrunk = shade_coefficients(&slope, 3, 3, 1.0, 1.0, 0.001, 1.0)[4];
        assert!(scaled < unscaled);
        assert!((scaled - 1.0).abs() < 1e-2);
        assert!((scaled - shrunk).abs() < 1e-6);
    }

    #[test]
    fn test_missing_neighbour_is_unshaded() {
        let mut elevation = grid(3, 3, |_, _| 5.0);
        elevation[0] = None;
        let coeffs = shade_coefficients(&elevation, 3, 3, 1.0, 1.0, 1.0, 1.0);
        assert!(coeffs.iter().all(|c| *c == UNSHADED));
    }

    #[test]
    fn test_apply_shade_saturates() {
        let mut buffer = RasterBuffer::new(
            3,
            1,
            SampleType::UInt8,
            PixelType::Grayscale,
            1,
            SampleBuffer::UInt8(vec![200, 200, 200]),
        )
        .unwrap();
        apply_shade(&mut buffer, &[2.0, 0.5, UNSHADED]).unwrap();
        assert_eq!(buffer.typed::<u8>().unwrap(), &[255, 100, 200]);
    }

    #[test]
    fn test_brightness_keeps_unshaded_pixels() {
        let mut buffer = RasterBuffer::new(
            2,
            1,
            SampleType::UInt8,
            PixelType::Grayscale,
            1,
            SampleBuffer::UInt8(vec![7, 7]),
        )
        .unwrap();
        write_brightness(&mut buffer, &[1.0, UNSHADED]).unwrap();
        assert_eq!(buffer.typed::<u8>().unwrap(), &[255, 7]);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let mut buffer = RasterBuffer::zeroed(2, 2, SampleType::UInt8, PixelType::Grayscale, 1).unwrap();
        assert!(apply_shade(&mut buffer, &[1.0]).is_err());
    }
}
