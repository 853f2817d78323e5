//! Per-pixel copy, band selection and color transforms.
//!
//! Every function takes the painted pixel pairs of one tile as
//! `(source pixel index, output pixel index)` and writes only those pixels.
//! UINT8 and UINT16 band selection are separate specializations.

use raster_common::{Palette, Sample};
use raster_style::ColorMap;

use crate::enhance::ChannelEnhancer;

/// Pixel index pairs `(source, output)`.
pub type PixelPairs = [(usize, usize)];

/// Copy all bands unchanged.
pub fn passthrough<T: Sample>(src: &[T], bands: usize, pairs: &PixelPairs, out: &mut [T]) {
    for &(s, d) in pairs {
        out[d * bands..(d + 1) * bands].copy_from_slice(&src[s * bands..(s + 1) * bands]);
    }
}

/// Three 8-bit source bands into an 8-bit RGB pixel.
pub fn triple_u8(
    src: &[u8],
    src_bands: usize,
    bands: [usize; 3],
    pairs: &PixelPairs,
    out: &mut [u8],
    enhancers: Option<&[ChannelEnhancer; 3]>,
) {
    for &(s, d) in pairs {
        let base = s * src_bands;
        for (i, &band) in bands.iter().enumerate() {
            let v = src[base + band];
            out[d * 3 + i] = match enhancers {
                Some(e) => e[i].apply(v as f64),
                None => v,
            };
        }
    }
}

/// Three 16-bit source bands into a 16-bit RGB pixel.
pub fn triple_u16(
    src: &[u16],
    src_bands: usize,
    bands: [usize; 3],
    pairs: &PixelPairs,
    out: &mut [u16],
) {
    for &(s, d) in pairs {
        let base = s * src_bands;
        for (i, &band) in bands.iter().enumerate() {
            out[d * 3 + i] = src[base + band];
        }
    }
}

/// Three 16-bit source bands enhanced into an 8-bit RGB pixel.
pub fn triple_u16_enhanced(
    src: &[u16],
    src_bands: usize,
    bands: [usize; 3],
    pairs: &PixelPairs,
    out: &mut [u8],
    enhancers: &[ChannelEnhancer; 3],
) {
    for &(s, d) in pairs {
        let base = s * src_bands;
        for (i, &band) in bands.iter().enumerate() {
            out[d * 3 + i] = enhancers[i].apply(src[base + band] as f64);
        }
    }
}

/// One 8-bit source band into an 8-bit gray pixel.
pub fn mono_u8(
    src: &[u8],
    src_bands: usize,
    band: usize,
    pairs: &PixelPairs,
    out: &mut [u8],
    enhancer: Option<&ChannelEnhancer>,
) {
    for &(s, d) in pairs {
        let v = src[s * src_bands + band];
        out[d] = match enhancer {
            Some(e) => e.apply(v as f64),
            None => v,
        };
    }
}

/// One 16-bit source band into a 16-bit datagrid pixel.
pub fn mono_u16(src: &[u16], src_bands: usize, band: usize, pairs: &PixelPairs, out: &mut [u16]) {
    for &(s, d) in pairs {
        out[d] = src[s * src_bands + band];
    }
}

/// One 16-bit source band enhanced into an 8-bit gray pixel.
pub fn mono_u16_enhanced(
    src: &[u16],
    src_bands: usize,
    band: usize,
    pairs: &PixelPairs,
    out: &mut [u8],
    enhancer: &ChannelEnhancer,
) {
    for &(s, d) in pairs {
        out[d] = enhancer.apply(src[s * src_bands + band] as f64);
    }
}

/// One source band of any type enhanced into an 8-bit gray pixel.
pub fn enhance_band<T: Sample>(
    src: &[T],
    src_bands: usize,
    band: usize,
    pairs: &PixelPairs,
    out: &mut [u8],
    enhancer: &ChannelEnhancer,
) {
    for &(s, d) in pairs {
        let v = src[s * src_bands + band].to_f64().unwrap_or(f64::NAN);
        out[d] = enhancer.apply(v);
    }
}

/// One source band through a color map into an 8-bit RGB pixel.
pub fn color_map<T: Sample>(
    src: &[T],
    src_bands: usize,
    band: usize,
    pairs: &PixelPairs,
    map: &ColorMap,
    out: &mut [u8],
) {
    for &(s, d) in pairs {
        let v = src[s * src_bands + band].to_f64().unwrap_or(f64::NAN);
        let color = map.color_for(v);
        out[d * 3] = color.r;
        out[d * 3 + 1] = color.g;
        out[d * 3 + 2] = color.b;
    }
}

/// PALETTE indices into 8-bit RGB pixels.
pub fn palette_expand(src: &[u8], pairs: &PixelPairs, palette: &Palette, out: &mut [u8]) {
    for &(s, d) in pairs {
        let color = palette.color(src[s]);
        out[d * 3] = color.r;
        out[d * 3 + 1] = color.g;
        out[d * 3 + 2] = color.b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{Rgb, SampleType};
    use raster_style::{CategorizeMap, ColorMapEntry, ContrastEnhancement};

    #[test]
    fn test_triple_u16_picks_bands() {
        // Two pixels, four bands each.
        let src: Vec<u16> = vec![10, 11, 12, 13, 20, 21, 22, 23];
        let mut out = vec![0u16; 6];
        triple_u16(&src, 4, [2, 1, 0], &[(0, 1), (1, 0)], &mut out);
        assert_eq!(out, vec![22, 21, 20, 12, 11, 10]);
    }

    #[test]
    fn test_mono_u8_with_gamma() {
        let src: Vec<u8> = vec![0, 64, 255, 1];
        let mut out = vec![0u8; 2];
        let gamma = ChannelEnhancer::new(ContrastEnhancement::Gamma(2.0), SampleType::UInt8, None);
        mono_u8(&src, 2, 1, &[(0, 0), (1, 1)], &mut out, Some(&gamma));
        assert_eq!(out, vec![127, 15]);
    }

    #[test]
    fn test_unpaired_pixels_untouched() {
        let src: Vec<u8> = vec![5, 6, 7];
        let mut out = vec![9u8; 3];
        passthrough(&src, 1, &[(2, 0)], &mut out);
        assert_eq!(out, vec![7, 9, 9]);
    }

    #[test]
    fn test_color_map_writes_rgb() {
        let map = ColorMap::Categorize(CategorizeMap {
            base_color: Rgb::BLACK,
            default_color: Rgb::WHITE,
            breakpoints: vec![ColorMapEntry::new(10.0, Rgb::new(255, 0, 0))],
        });
        let src: Vec<f32> = vec![5.0, 15.0, f32::NAN];
        let mut out = vec![0u8; 9];
        color_map(&src, 1, 0, &[(0, 0), (1, 1), (2, 2)], &map, &mut out);
        assert_eq!(out, vec![0, 0, 0, 255, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_palette_expand() {
        let palette = Palette::new(vec![Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)]).unwrap();
        let mut out = vec![0u8; 6];
        palette_expand(&[1, 0], &[(0, 0), (1, 1)], &palette, &mut out);
        assert_eq!(out, vec![4, 5, 6, 1, 2, 3]);
    }
}
