//! Loads a full-resolution raster into a store as encoded tiles.

use serde::Serialize;
use tracing::{debug, info};

use raster_common::{
    BandStatistics, BoundingBox, DecodedTile, Pixel, PyramidLevel, RasterBuffer, RasterError,
    RasterResult, RasterStatistics, SampleBuffer,
};

use crate::codec::TileCodec;
use crate::store::{MemoryTileStore, TileStore};

/// Outcome of a load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub coverage: String,
    pub level: u32,
    pub tiles: usize,
    pub valid_pixels: u64,
    pub no_data_pixels: u64,
}

/// Cut `raster` into coverage-sized tiles and store them on `level`.
///
/// The raster's top-left corner sits at (`min_x`, `max_y`); pixel size is
/// the coverage's base resolution. Edge tiles are padded to the full tile
/// size with NODATA (or zero) and the padding is masked transparent.
/// Band statistics are recomputed from the whole raster.
pub fn load_coverage_raster(
    store: &mut MemoryTileStore,
    codec: &dyn TileCodec,
    coverage_name: &str,
    level: u32,
    raster: &RasterBuffer,
    min_x: f64,
    max_y: f64,
) -> RasterResult<LoadSummary> {
    let coverage = store.coverage(coverage_name)?;
    if raster.sample_type() != coverage.sample_type()
        || raster.pixel_type() != coverage.pixel_type()
        || raster.num_bands() != coverage.num_bands()
    {
        return Err(RasterError::invalid_argument(format!(
            "raster {}/{}/{} does not match coverage '{}' ({}/{}/{})",
            raster.sample_type(),
            raster.pixel_type(),
            raster.num_bands(),
            coverage.name(),
            coverage.sample_type(),
            coverage.pixel_type(),
            coverage.num_bands()
        )));
    }

    let (x_res, y_res) = coverage.resolution();
    store.add_level(coverage_name, PyramidLevel::from_base(level, x_res, y_res))?;

    let tile_w = coverage.tile_width();
    let tile_h = coverage.tile_height();
    let tiles_x = raster.width().div_ceil(tile_w);
    let tiles_y = raster.height().div_ceil(tile_h);
    let no_data = coverage.no_data().cloned();

    let mut count = 0;
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let tile = cut_tile(raster, tx * tile_w, ty * tile_h, tile_w, tile_h, no_data.as_ref())?;
            let encoded = codec.encode(&tile)?;

            let tile_min_x = min_x + (tx * tile_w) as f64 * x_res;
            let tile_max_y = max_y - (ty * tile_h) as f64 * y_res;
            let bbox = BoundingBox::new(
                tile_min_x,
                tile_max_y - tile_h as f64 * y_res,
                tile_min_x + tile_w as f64 * x_res,
                tile_max_y,
            );
            let tile_id = store.insert_tile(
                coverage_name,
                level,
                bbox,
                tile_w,
                tile_h,
                encoded.odd,
                Some(encoded.even),
            )?;
            debug!(coverage = coverage_name, tile_id, tx, ty, "Stored tile");
            count += 1;
        }
    }

    let statistics = compute_statistics(raster, no_data.as_ref());
    let summary = LoadSummary {
        coverage: coverage_name.to_string(),
        level,
        tiles: count,
        valid_pixels: statistics.valid_count,
        no_data_pixels: statistics.no_data_count,
    };
    store.set_statistics(coverage_name, statistics)?;

    info!(
        coverage = coverage_name,
        level,
        tiles = count,
        width = raster.width(),
        height = raster.height(),
        "Loaded coverage raster"
    );
    Ok(summary)
}

/// Copy one tile-sized window out of `raster`, padding past its edges.
fn cut_tile(
    raster: &RasterBuffer,
    origin_col: u32,
    origin_row: u32,
    tile_w: u32,
    tile_h: u32,
    no_data: Option<&Pixel>,
) -> RasterResult<DecodedTile> {
    let bands = raster.num_bands() as usize;
    let src = raster.samples();
    let mut samples = SampleBuffer::zeroed(raster.sample_type(), tile_w as usize * tile_h as usize * bands);
    let mut mask = vec![1u8; tile_w as usize * tile_h as usize];
    let mut padded = false;

    for row in 0..tile_h {
        for col in 0..tile_w {
            let dst = (row as usize * tile_w as usize + col as usize) * bands;
            let (src_col, src_row) = (origin_col + col, origin_row + row);
            if src_col < raster.width() && src_row < raster.height() {
                let base = raster.offset(src_col, src_row);
                for b in 0..bands {
                    if let Some(value) = src.get_value(base + b) {
                        samples.set_value(dst + b, value);
                    }
                }
            } else {
                padded = true;
                mask[dst / bands] = 0;
                if let Some(pixel) = no_data {
                    for (b, &value) in pixel.samples().iter().enumerate() {
                        samples.set_value(dst + b, value);
                    }
                }
            }
        }
    }

    let tile = RasterBuffer::new(
        tile_w,
        tile_h,
        raster.sample_type(),
        raster.pixel_type(),
        raster.num_bands(),
        samples,
    )?;
    Ok(DecodedTile {
        raster: tile,
        mask: padded.then_some(mask),
        no_data: no_data.cloned(),
    })
}

fn is_no_data(raster: &RasterBuffer, base: usize, no_data: Option<&Pixel>) -> bool {
    let Some(pixel) = no_data else {
        return false;
    };
    pixel
        .samples()
        .iter()
        .enumerate()
        .all(|(b, v)| raster.samples().get_f64(base + b) == Some(v.as_f64()))
}

/// Per-band min, max and 256-bin histogram over the non-NODATA pixels.
///
/// NaN samples are not counted. A band without any valid sample reports
/// a zero range and an empty histogram.
pub fn compute_statistics(raster: &RasterBuffer, no_data: Option<&Pixel>) -> RasterStatistics {
    let bands = raster.num_bands() as usize;
    let samples = raster.samples();
    let mut mins = vec![f64::INFINITY; bands];
    let mut maxs = vec![f64::NEG_INFINITY; bands];
    let mut valid_count = 0u64;
    let mut no_data_count = 0u64;

    for row in 0..raster.height() {
        for col in 0..raster.width() {
            let base = raster.offset(col, row);
            if is_no_data(raster, base, no_data) {
                no_data_count += 1;
                continue;
            }
            valid_count += 1;
            for b in 0..bands {
                if let Some(v) = samples.get_f64(base + b).filter(|v| !v.is_nan()) {
                    mins[b] = mins[b].min(v);
                    maxs[b] = maxs[b].max(v);
                }
            }
        }
    }

    let mut stats: Vec<BandStatistics> = (0..bands)
        .map(|b| {
            let (min, max) = if mins[b] <= maxs[b] {
                (mins[b], maxs[b])
            } else {
                (0.0, 0.0)
            };
            BandStatistics {
                min,
                max,
                histogram: vec![0.0; BandStatistics::HISTOGRAM_BINS],
            }
        })
        .collect();

    for row in 0..raster.height() {
        for col in 0..raster.width() {
            let base = raster.offset(col, row);
            if is_no_data(raster, base, no_data) {
                continue;
            }
            for (b, band) in stats.iter_mut().enumerate() {
                if let Some(v) = samples.get_f64(base + b).filter(|v| !v.is_nan()) {
                    let bin = band.bin(v);
                    band.histogram[bin] += 1.0;
                }
            }
        }
    }

    RasterStatistics {
        valid_count,
        no_data_count,
        bands: stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DeflateTileCodec;
    use raster_common::{Coverage, PixelType, SampleType, SampleValue, Scale};

    #[test]
    fn test_statistics_skip_no_data() {
        let raster = RasterBuffer::new(
            4,
            1,
            SampleType::Float32,
            PixelType::DataGrid,
            1,
            SampleBuffer::Float32(vec![1.0, -9999.0, 3.0, 5.0]),
        )
        .unwrap();
        let no_data = Pixel::datagrid(SampleValue::Float32(-9999.0)).unwrap();
        let stats = compute_statistics(&raster, Some(&no_data));

        assert_eq!(stats.valid_count, 3);
        assert_eq!(stats.no_data_count, 1);
        let band = stats.band(0).unwrap();
        assert_eq!((band.min, band.max), (1.0, 5.0));
        assert_eq!(band.histogram.iter().sum::<f64>(), 3.0);
        assert_eq!(band.histogram[0], 1.0);
        assert_eq!(band.histogram[255], 1.0);
    }

    #[test]
    fn test_edge_tiles_are_padded_and_masked() {
        let mut store = MemoryTileStore::new();
        store
            .add_coverage(
                Coverage::new("g", SampleType::UInt8, PixelType::Grayscale, 1, 4, 4, 1.0, 1.0)
                    .unwrap(),
            )
            .unwrap();
        let raster = RasterBuffer::new(
            6,
            4,
            SampleType::UInt8,
            PixelType::Grayscale,
            1,
            SampleBuffer::UInt8((0..24).collect()),
        )
        .unwrap();
        let codec = DeflateTileCodec::new();
        let summary = load_coverage_raster(&mut store, &codec, "g", 0, &raster, 0.0, 4.0).unwrap();
        assert_eq!(summary.tiles, 2);

        let tiles = store
            .query_tiles("g", 0, &BoundingBox::new(0.0, 0.0, 8.0, 4.0))
            .unwrap();
        assert_eq!(tiles[1].bbox, BoundingBox::new(4.0, 0.0, 8.0, 4.0));

        let payload = store.read_tile_payload(tiles[1].tile_id, true).unwrap();
        let decoded = codec
            .decode(&payload.odd, payload.even.as_deref(), Scale::Full, None)
            .unwrap();
        let mask = decoded.mask.unwrap();
        assert_eq!(&mask[..4], &[1, 1, 0, 0]);
        assert_eq!(decoded.raster.value_f64(1, 1, 0), Some(11.0));
    }
}
