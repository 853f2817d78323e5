//! Tile compositor: renders a view of a coverage from its stored tiles.
//!
//! ## Pipeline
//!
//! ```text
//! VALIDATE -> PRIME -> QUERY -> per tile { DECODE -> MAP -> TRANSPARENCY -> SELECT/STYLE } -> SHADE
//! ```
//!
//! Tiles are painted in the order the store returns them, so overlapping
//! tiles are last-writer-wins. Any store or decode failure aborts the whole
//! request; no partial buffer is returned.

use std::time::Instant;

use tracing::{debug, trace};

use raster_common::{
    BoundingBox, Coverage, DecodedTile, Pixel, RasterBuffer, RasterError, RasterResult,
    RasterStatistics, Sample, SampleBuffer, Scale, TileRef,
};
use raster_style::{ContrastEnhancement, RasterStyle};
use storage::{TileCodec, TileStore};

use crate::config::RenderConfig;
use crate::enhance::ChannelEnhancer;
use crate::output::{OutputFormat, RenderMode, RenderPlan};
use crate::prime::prime_buffer;
use crate::relief::{apply_shade, write_brightness};
use crate::resolution::{match_resolution, ResolutionMatch};
use crate::select;

/// Run `$body` with `$slice` bound to the typed sample slice of `$buffer`.
macro_rules! with_samples {
    ($buffer:expr, $slice:ident => $body:expr) => {
        match $buffer {
            ::raster_common::SampleBuffer::Int8($slice) => $body,
            ::raster_common::SampleBuffer::UInt8($slice) => $body,
            ::raster_common::SampleBuffer::Int16($slice) => $body,
            ::raster_common::SampleBuffer::UInt16($slice) => $body,
            ::raster_common::SampleBuffer::Int32($slice) => $body,
            ::raster_common::SampleBuffer::UInt32($slice) => $body,
            ::raster_common::SampleBuffer::Float32($slice) => $body,
            ::raster_common::SampleBuffer::Float64($slice) => $body,
        }
    };
}

pub(crate) use with_samples;

/// One view to render.
#[derive(Debug, Clone)]
pub struct ViewRequest {
    pub coverage: String,
    /// Geographic extent of the output.
    pub extent: BoundingBox,
    pub width: u32,
    pub height: u32,
    pub style: Option<RasterStyle>,
    /// Background for unpainted pixels, in the output format. In
    /// band-selection modes it also marks source pixels as transparent,
    /// compared in the source sample type over the selected bands.
    pub no_data: Option<Pixel>,
}

impl ViewRequest {
    pub fn new(coverage: impl Into<String>, extent: BoundingBox, width: u32, height: u32) -> Self {
        Self {
            coverage: coverage.into(),
            extent,
            width,
            height,
            style: None,
            no_data: None,
        }
    }

    pub fn with_style(mut self, style: RasterStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Set the NODATA pixel.
    ///
    /// Priming only uses a pixel that matches the output format, while
    /// transparency only uses one in the source sample type with one value
    /// per selected band. When an enhanced uint16 selection renders to
    /// uint8, no single pixel fits both: a uint16 pixel makes matching
    /// source pixels transparent over a zeroed background, a uint8 one
    /// primes the background but filters nothing.
    pub fn with_no_data(mut self, no_data: Pixel) -> Self {
        self.no_data = Some(no_data);
        self
    }

    /// Requested (x_res, y_res).
    pub fn resolution(&self) -> (f64, f64) {
        (
            self.extent.width() / self.width as f64,
            self.extent.height() / self.height as f64,
        )
    }

    fn validate(&self) -> RasterResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RasterError::invalid_argument(format!(
                "output size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.extent.is_valid() {
            return Err(RasterError::invalid_argument(format!(
                "degenerate extent {:?}",
                self.extent
            )));
        }
        Ok(())
    }
}

/// Per-request state shared by every tile.
struct Paint<'a> {
    coverage: &'a Coverage,
    plan: &'a RenderPlan,
    style: Option<&'a RasterStyle>,
    matched: ResolutionMatch,
    extent: BoundingBox,
    out_res: (f64, f64),
    /// Supplied NODATA used by the band-selection transparency test.
    no_data: Option<&'a Pixel>,
    enhancers: Vec<ChannelEnhancer>,
}

/// Renders views out of a tile store.
///
/// Holds only shared references, so one renderer can serve many threads.
pub struct Renderer<'a> {
    store: &'a dyn TileStore,
    codec: &'a dyn TileCodec,
    config: RenderConfig,
}

impl<'a> Renderer<'a> {
    pub fn new(store: &'a dyn TileStore, codec: &'a dyn TileCodec, config: RenderConfig) -> Self {
        Self {
            store,
            codec,
            config,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn store(&self) -> &'a dyn TileStore {
        self.store
    }

    /// Render one view.
    pub fn render_view(&self, request: &ViewRequest) -> RasterResult<RasterBuffer> {
        let start = Instant::now();
        request.validate()?;

        let coverage = self.store.coverage(&request.coverage)?;
        let style = request.style.as_ref();
        let plan = RenderPlan::resolve(&coverage, style)?;

        let (x_res, y_res) = request.resolution();
        let levels = self.store.pyramid_levels(coverage.name())?;
        let matched = match_resolution(&levels, x_res, y_res)?;

        let buffer = if plan.mode == RenderMode::ReliefOnly {
            let mut buffer = prime_buffer(
                request.width,
                request.height,
                plan.format.sample_type,
                plan.format.pixel_type,
                plan.format.num_bands,
                request.no_data.as_ref(),
            )?;
            let coeffs = self.relief_for(&coverage, request, &plan)?;
            write_brightness(&mut buffer, &coeffs)?;
            buffer
        } else {
            let statistics = if plan.needs_statistics(style) {
                self.store.band_statistics(coverage.name())?
            } else {
                None
            };
            let paint = Paint {
                coverage: &coverage,
                plan: &plan,
                style,
                matched,
                extent: request.extent,
                out_res: (x_res, y_res),
                no_data: request.no_data.as_ref(),
                enhancers: build_enhancers(&coverage, &plan, style, statistics.as_ref()),
            };
            let mut buffer = self.composite(&paint, request.width, request.height, request.no_data.as_ref())?;

            if plan.relief.is_some() {
                let coeffs = self.relief_for(&coverage, request, &plan)?;
                apply_shade(&mut buffer, &coeffs)?;
            }
            buffer
        };

        debug!(
            coverage = coverage.name(),
            width = request.width,
            height = request.height,
            level = matched.level,
            scale = %matched.scale,
            mode = ?plan.mode,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Rendered view"
        );
        Ok(buffer)
    }

    fn relief_for(
        &self,
        coverage: &Coverage,
        request: &ViewRequest,
        plan: &RenderPlan,
    ) -> RasterResult<Vec<f32>> {
        let factor = plan
            .relief
            .map(|r| r.relief_factor)
            .filter(|f| f.is_finite() && *f > 0.0)
            .unwrap_or(self.config.default_relief_factor);
        self.shaded_relief(
            coverage.name(),
            &request.extent,
            request.width,
            request.height,
            factor,
            self.config.relief_scale_factor,
        )
    }

    /// Read a coverage in its own format over an extent, without styling.
    pub(crate) fn read_passthrough(
        &self,
        coverage: &Coverage,
        extent: &BoundingBox,
        width: u32,
        height: u32,
    ) -> RasterResult<RasterBuffer> {
        let request = ViewRequest::new(coverage.name(), *extent, width, height);
        request.validate()?;
        let (x_res, y_res) = request.resolution();
        let levels = self.store.pyramid_levels(coverage.name())?;
        let matched = match_resolution(&levels, x_res, y_res)?;
        let plan = RenderPlan::passthrough(coverage);
        let paint = Paint {
            coverage,
            plan: &plan,
            style: None,
            matched,
            extent: *extent,
            out_res: (x_res, y_res),
            no_data: None,
            enhancers: Vec::new(),
        };
        self.composite(&paint, width, height, coverage.no_data())
    }

    /// PRIME, QUERY, then paint every returned tile.
    fn composite(
        &self,
        paint: &Paint<'_>,
        width: u32,
        height: u32,
        fill: Option<&Pixel>,
    ) -> RasterResult<RasterBuffer> {
        let format = paint.plan.format;
        let mut out = prime_buffer(
            width,
            height,
            format.sample_type,
            format.pixel_type,
            format.num_bands,
            fill,
        )?;

        let tiles = self
            .store
            .query_tiles(paint.coverage.name(), paint.matched.level, &paint.extent)?;

        let scale = paint.matched.scale;
        let mut painted = 0usize;
        for tile in &tiles {
            let payload = self
                .store
                .read_tile_payload(tile.tile_id, scale == Scale::Full)?;
            let decoded = self.codec.decode(
                &payload.odd,
                payload.even.as_deref(),
                scale,
                paint.coverage.palette(),
            )?;
            check_decoded(paint.coverage, tile, scale, &decoded)?;

            let pairs = map_pixels(tile, &decoded, paint, width, height);
            let pairs = opaque_pairs(&decoded, pairs, paint);
            trace!(tile_id = tile.tile_id, pixels = pairs.len(), "Painting tile");
            painted += pairs.len();

            paint_pixels(paint, &decoded, &pairs, &mut out)?;
        }

        debug!(
            coverage = paint.coverage.name(),
            tiles = tiles.len(),
            pixels = painted,
            "Composited tiles"
        );
        Ok(out)
    }
}

fn check_decoded(
    coverage: &Coverage,
    tile: &TileRef,
    scale: Scale,
    decoded: &DecodedTile,
) -> RasterResult<()> {
    let (w, h) = tile.dimensions_at(scale);
    let raster = &decoded.raster;
    if raster.width() != w || raster.height() != h {
        return Err(RasterError::corrupt_tile(format!(
            "tile {} decoded to {}x{}, expected {}x{} at {}",
            tile.tile_id,
            raster.width(),
            raster.height(),
            w,
            h,
            scale
        )));
    }
    if raster.sample_type() != coverage.sample_type()
        || raster.pixel_type() != coverage.pixel_type()
        || raster.num_bands() != coverage.num_bands()
    {
        return Err(RasterError::corrupt_tile(format!(
            "tile {} is {}/{}/{}, coverage '{}' is {}/{}/{}",
            tile.tile_id,
            raster.sample_type(),
            raster.pixel_type(),
            raster.num_bands(),
            coverage.name(),
            coverage.sample_type(),
            coverage.pixel_type(),
            coverage.num_bands()
        )));
    }
    Ok(())
}

/// Map every masked-in tile pixel onto the output grid by its centre.
fn map_pixels(
    tile: &TileRef,
    decoded: &DecodedTile,
    paint: &Paint<'_>,
    out_w: u32,
    out_h: u32,
) -> Vec<(usize, usize)> {
    let (tile_x_res, tile_y_res) = (paint.matched.x_res, paint.matched.y_res);
    let (out_x_res, out_y_res) = paint.out_res;
    let tile_w = decoded.raster.width();
    let tile_h = decoded.raster.height();

    let mut pairs = Vec::new();
    for row in 0..tile_h {
        let geo_y = tile.bbox.max_y - (row as f64 + 0.5) * tile_y_res;
        let out_y = ((paint.extent.max_y - geo_y) / out_y_res).floor();
        if out_y < 0.0 || out_y >= out_h as f64 {
            continue;
        }
        for col in 0..tile_w {
            let geo_x = tile.bbox.min_x + (col as f64 + 0.5) * tile_x_res;
            let out_x = ((geo_x - paint.extent.min_x) / out_x_res).floor();
            if out_x < 0.0 || out_x >= out_w as f64 {
                continue;
            }
            let src = row as usize * tile_w as usize + col as usize;
            if !decoded.is_opaque(src) {
                continue;
            }
            pairs.push((src, out_y as usize * out_w as usize + out_x as usize));
        }
    }
    pairs
}

/// Drop pixels matching the tile's NODATA or, when selecting bands, the
/// supplied NODATA on every selected band.
fn opaque_pairs(
    decoded: &DecodedTile,
    pairs: Vec<(usize, usize)>,
    paint: &Paint<'_>,
) -> Vec<(usize, usize)> {
    let bands = decoded.raster.num_bands() as usize;
    let selected: Vec<usize> = if paint.plan.mode.is_band_selection() {
        paint
            .plan
            .mode
            .selected_bands()
            .into_iter()
            .map(usize::from)
            .collect()
    } else {
        Vec::new()
    };
    with_samples!(decoded.raster.samples(), src => {
        let tile_no_data = decoded.no_data.as_ref().and_then(|p| p.typed());
        let supplied = paint
            .no_data
            .filter(|p| !selected.is_empty() && p.band_count() as usize == selected.len())
            .and_then(|p| p.typed());
        filter_transparent(src, bands, pairs, tile_no_data.as_deref(), &selected, supplied.as_deref())
    })
}

fn filter_transparent<T: Sample>(
    src: &[T],
    bands: usize,
    mut pairs: Vec<(usize, usize)>,
    tile_no_data: Option<&[T]>,
    selected: &[usize],
    supplied: Option<&[T]>,
) -> Vec<(usize, usize)> {
    if tile_no_data.is_none() && supplied.is_none() {
        return pairs;
    }
    pairs.retain(|&(s, _)| {
        let pixel = &src[s * bands..(s + 1) * bands];
        if tile_no_data.map_or(false, |nd| nd == pixel) {
            return false;
        }
        if let Some(nd) = supplied {
            if selected.iter().zip(nd).all(|(&b, v)| pixel[b] == *v) {
                return false;
            }
        }
        true
    });
    pairs
}

fn build_enhancers(
    coverage: &Coverage,
    plan: &RenderPlan,
    style: Option<&RasterStyle>,
    statistics: Option<&RasterStatistics>,
) -> Vec<ChannelEnhancer> {
    let overall = style.map_or(ContrastEnhancement::None, RasterStyle::contrast_enhancement);
    let enhancer = |band: u8, own: ContrastEnhancement| {
        let method = if own.is_none() { overall } else { own };
        ChannelEnhancer::new(
            method,
            coverage.sample_type(),
            statistics.and_then(|s| s.band(band)),
        )
    };
    match plan.mode {
        RenderMode::Triple { channels, .. } => channels
            .iter()
            .map(|c| enhancer(c.band, c.contrast))
            .collect(),
        RenderMode::Mono { channel, .. } => vec![enhancer(channel.band, channel.contrast)],
        RenderMode::Enhance { band } => vec![enhancer(band, ContrastEnhancement::None)],
        _ => Vec::new(),
    }
}

fn as_triple(enhancers: &[ChannelEnhancer]) -> RasterResult<&[ChannelEnhancer; 3]> {
    enhancers
        .try_into()
        .map_err(|_| RasterError::invalid_argument("triple selection needs three enhancers"))
}

fn mismatch(plan: &RenderPlan) -> RasterError {
    RasterError::corrupt_tile(format!(
        "tile samples do not fit the {:?} pipeline",
        plan.mode
    ))
}

/// SELECT/TRANSFORM and STYLE APPLY for one tile.
fn paint_pixels(
    paint: &Paint<'_>,
    decoded: &DecodedTile,
    pairs: &[(usize, usize)],
    out: &mut RasterBuffer,
) -> RasterResult<()> {
    let plan = paint.plan;
    let src = decoded.raster.samples();
    let src_bands = decoded.raster.num_bands() as usize;
    let out_bands = out.num_bands() as usize;

    match plan.mode {
        RenderMode::Passthrough => passthrough_samples(src, out_bands, pairs, out.samples_mut())
            .ok_or_else(|| mismatch(plan)),
        RenderMode::Triple { channels, enhanced } => {
            let bands = channels.map(|c| c.band as usize);
            let has_contrast = paint.style.map_or(false, RasterStyle::has_contrast);
            match (src, out.samples_mut()) {
                (SampleBuffer::UInt8(s), SampleBuffer::UInt8(o)) => {
                    let enhancers = if has_contrast {
                        Some(as_triple(&paint.enhancers)?)
                    } else {
                        None
                    };
                    select::triple_u8(s, src_bands, bands, pairs, o, enhancers);
                    Ok(())
                }
                (SampleBuffer::UInt16(s), SampleBuffer::UInt16(o)) if !enhanced => {
                    select::triple_u16(s, src_bands, bands, pairs, o);
                    Ok(())
                }
                (SampleBuffer::UInt16(s), SampleBuffer::UInt8(o)) => {
                    let enhancers = as_triple(&paint.enhancers)?;
                    select::triple_u16_enhanced(s, src_bands, bands, pairs, o, enhancers);
                    Ok(())
                }
                _ => Err(mismatch(plan)),
            }
        }
        RenderMode::Mono { channel, enhanced } => {
            let band = channel.band as usize;
            let has_contrast = paint.style.map_or(false, RasterStyle::has_contrast);
            match (src, out.samples_mut()) {
                (SampleBuffer::UInt8(s), SampleBuffer::UInt8(o)) => {
                    let enhancer = paint.enhancers.first().filter(|_| has_contrast);
                    select::mono_u8(s, src_bands, band, pairs, o, enhancer);
                    Ok(())
                }
                (SampleBuffer::UInt16(s), SampleBuffer::UInt16(o)) if !enhanced => {
                    select::mono_u16(s, src_bands, band, pairs, o);
                    Ok(())
                }
                (SampleBuffer::UInt16(s), SampleBuffer::UInt8(o)) => {
                    let enhancer = paint.enhancers.first().ok_or_else(|| mismatch(plan))?;
                    select::mono_u16_enhanced(s, src_bands, band, pairs, o, enhancer);
                    Ok(())
                }
                _ => Err(mismatch(plan)),
            }
        }
        RenderMode::ColorMap { band, .. } => {
            let map = paint
                .style
                .and_then(RasterStyle::color_map)
                .ok_or_else(|| mismatch(plan))?;
            let o = out.typed_mut::<u8>().ok_or_else(|| mismatch(plan))?;
            with_samples!(src, s => select::color_map(s, src_bands, band as usize, pairs, map, o));
            Ok(())
        }
        RenderMode::PaletteExpand => {
            let palette = paint.coverage.palette().ok_or_else(|| {
                RasterError::invalid_argument(format!(
                    "coverage '{}' has no palette to expand",
                    paint.coverage.name()
                ))
            })?;
            let s = decoded.raster.typed::<u8>().ok_or_else(|| mismatch(plan))?;
            let o = out.typed_mut::<u8>().ok_or_else(|| mismatch(plan))?;
            select::palette_expand(s, pairs, palette, o);
            Ok(())
        }
        RenderMode::Enhance { band } => {
            let enhancer = paint.enhancers.first().ok_or_else(|| mismatch(plan))?;
            let o = out.typed_mut::<u8>().ok_or_else(|| mismatch(plan))?;
            with_samples!(src, s => select::enhance_band(s, src_bands, band as usize, pairs, o, enhancer));
            Ok(())
        }
        RenderMode::ReliefOnly => Ok(()),
    }
}

fn passthrough_samples(
    src: &SampleBuffer,
    bands: usize,
    pairs: &[(usize, usize)],
    out: &mut SampleBuffer,
) -> Option<()> {
    match (src, out) {
        (SampleBuffer::Int8(s), SampleBuffer::Int8(o)) => select::passthrough(s, bands, pairs, o),
        (SampleBuffer::UInt8(s), SampleBuffer::UInt8(o)) => select::passthrough(s, bands, pairs, o),
        (SampleBuffer::Int16(s), SampleBuffer::Int16(o)) => select::passthrough(s, bands, pairs, o),
        (SampleBuffer::UInt16(s), SampleBuffer::UInt16(o)) => {
            select::passthrough(s, bands, pairs, o)
        }
        (SampleBuffer::Int32(s), SampleBuffer::Int32(o)) => select::passthrough(s, bands, pairs, o),
        (SampleBuffer::UInt32(s), SampleBuffer::UInt32(o)) => {
            select::passthrough(s, bands, pairs, o)
        }
        (SampleBuffer::Float32(s), SampleBuffer::Float32(o)) => {
            select::passthrough(s, bands, pairs, o)
        }
        (SampleBuffer::Float64(s), SampleBuffer::Float64(o)) => {
            select::passthrough(s, bands, pairs, o)
        }
        _ => return None,
    }
    Some(())
}

/// Output format for a request, without rendering it.
pub fn resolve_output_format(
    store: &dyn TileStore,
    request: &ViewRequest,
) -> RasterResult<OutputFormat> {
    let coverage = store.coverage(&request.coverage)?;
    OutputFormat::resolve(&coverage, request.style.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{PixelType, PyramidLevel, SampleType};

    fn paint_for<'a>(coverage: &'a Coverage, plan: &'a RenderPlan, extent: BoundingBox) -> Paint<'a> {
        Paint {
            coverage,
            plan,
            style: None,
            matched: ResolutionMatch {
                level: 0,
                scale: Scale::Full,
                x_res: 1.0,
                y_res: 1.0,
            },
            extent,
            out_res: (1.0, 1.0),
            no_data: None,
            enhancers: Vec::new(),
        }
    }

    fn gray_tile(width: u32, height: u32, values: Vec<u8>) -> DecodedTile {
        DecodedTile {
            raster: RasterBuffer::new(
                width,
                height,
                SampleType::UInt8,
                PixelType::Grayscale,
                1,
                SampleBuffer::UInt8(values),
            )
            .unwrap(),
            mask: None,
            no_data: None,
        }
    }

    fn coverage() -> Coverage {
        Coverage::new("g", SampleType::UInt8, PixelType::Grayscale, 1, 2, 2, 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_map_pixels_offsets_by_extent() {
        let coverage = coverage();
        let plan = RenderPlan::passthrough(&coverage);
        let paint = paint_for(&coverage, &plan, BoundingBox::new(1.0, 0.0, 4.0, 3.0));
        let tile = TileRef {
            tile_id: 0,
            level: 0,
            bbox: BoundingBox::new(0.0, 1.0, 2.0, 3.0),
            width: 2,
            height: 2,
        };
        let pairs = map_pixels(&tile, &gray_tile(2, 2, vec![0; 4]), &paint, 3, 3);
        // Column 0 of the tile falls left of the extent.
        assert_eq!(pairs, vec![(1, 0), (3, 3)]);
    }

    #[test]
    fn test_map_pixels_outside_extent_is_empty() {
        let coverage = coverage();
        let plan = RenderPlan::passthrough(&coverage);
        let paint = paint_for(&coverage, &plan, BoundingBox::new(0.0, 0.0, 4.0, 4.0));
        let tile = TileRef {
            tile_id: 0,
            level: 0,
            bbox: BoundingBox::new(10.0, 10.0, 12.0, 12.0),
            width: 2,
            height: 2,
        };
        assert!(map_pixels(&tile, &gray_tile(2, 2, vec![0; 4]), &paint, 4, 4).is_empty());
    }

    #[test]
    fn test_mask_and_tile_no_data_are_transparent() {
        let coverage = coverage();
        let plan = RenderPlan::passthrough(&coverage);
        let paint = paint_for(&coverage, &plan, BoundingBox::new(0.0, 0.0, 2.0, 2.0));
        let mut tile = gray_tile(2, 2, vec![1, 2, 3, 4]);
        tile.mask = Some(vec![1, 0, 1, 1]);
        tile.no_data = Some(Pixel::from_u8(SampleType::UInt8, PixelType::Grayscale, &[3]).unwrap());
        let tile_ref = TileRef {
            tile_id: 0,
            level: 0,
            bbox: BoundingBox::new(0.0, 0.0, 2.0, 2.0),
            width: 2,
            height: 2,
        };
        let pairs = map_pixels(&tile_ref, &tile, &paint, 2, 2);
        let pairs = opaque_pairs(&tile, pairs, &paint);
        assert_eq!(pairs, vec![(0, 0), (3, 3)]);
    }

    #[test]
    fn test_supplied_no_data_checks_selected_bands_only() {
        // Two 4-band pixels; bands 2, 1, 0 of the first equal the supplied NODATA.
        let src: Vec<u16> = vec![1, 2, 3, 9, 1, 2, 4, 9];
        let pairs = vec![(0, 0), (1, 1)];
        let kept = filter_transparent(&src, 4, pairs, None, &[2, 1, 0], Some(&[3, 2, 1][..]));
        assert_eq!(kept, vec![(1, 1)]);
    }

    #[test]
    fn test_tile_no_data_needs_every_band() {
        let src: Vec<u8> = vec![0, 0, 0, 0, 0, 1];
        let kept = filter_transparent(&src, 3, vec![(0, 0), (1, 1)], Some(&[0, 0, 0][..]), &[], None);
        assert_eq!(kept, vec![(1, 1)]);
    }

    #[test]
    fn test_request_resolution() {
        let request = ViewRequest::new("g", BoundingBox::new(0.0, 0.0, 10.0, 5.0), 5, 10);
        assert_eq!(request.resolution(), (2.0, 0.5));
        let level = PyramidLevel::from_base(0, 1.0, 0.25);
        assert_eq!(level.resolution(Scale::Half), Some((2.0, 0.5)));
    }
}
