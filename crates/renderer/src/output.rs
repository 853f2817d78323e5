//! Output format and pixel pipeline selection for a coverage/style pair.

use tracing::{debug, warn};

use raster_common::{Coverage, PixelType, RasterError, RasterResult, SampleType};
use raster_style::{BandSelection, Channel, RasterStyle, ShadedRelief};

/// Shape of the rendered buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub sample_type: SampleType,
    pub pixel_type: PixelType,
    pub num_bands: u8,
}

impl OutputFormat {
    pub const RGB_U8: OutputFormat = OutputFormat {
        sample_type: SampleType::UInt8,
        pixel_type: PixelType::Rgb,
        num_bands: 3,
    };

    pub const GRAY_U8: OutputFormat = OutputFormat {
        sample_type: SampleType::UInt8,
        pixel_type: PixelType::Grayscale,
        num_bands: 1,
    };

    /// The coverage's own format.
    pub fn of(coverage: &Coverage) -> Self {
        Self {
            sample_type: coverage.sample_type(),
            pixel_type: coverage.pixel_type(),
            num_bands: coverage.num_bands(),
        }
    }

    /// Output format for rendering `coverage` with `style`.
    pub fn resolve(coverage: &Coverage, style: Option<&RasterStyle>) -> RasterResult<Self> {
        RenderPlan::resolve(coverage, style).map(|plan| plan.format)
    }
}

/// Per-pixel transform applied while painting tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderMode {
    /// Copy every band unchanged.
    Passthrough,
    /// Three source bands into RGB; `enhanced` output is always 8-bit.
    Triple { channels: [Channel; 3], enhanced: bool },
    /// One source band into a gray or 16-bit datagrid pixel.
    Mono { channel: Channel, enhanced: bool },
    /// One source band through the style's color map into RGB. `selected`
    /// is set when the band came from a gray channel selection.
    ColorMap { band: u8, selected: bool },
    /// PALETTE indices expanded through the coverage palette into RGB.
    PaletteExpand,
    /// One source band through the overall enhancement into 8-bit gray.
    Enhance { band: u8 },
    /// Only the shaded-relief brightness is drawn.
    ReliefOnly,
}

impl RenderMode {
    /// Whether this mode selects bands out of a multiband source.
    pub fn is_band_selection(&self) -> bool {
        matches!(
            self,
            RenderMode::Triple { .. }
                | RenderMode::Mono { .. }
                | RenderMode::ColorMap { selected: true, .. }
        )
    }

    /// Source bands read by the mode, in output order.
    pub fn selected_bands(&self) -> Vec<u8> {
        match self {
            RenderMode::Triple { channels, .. } => channels.iter().map(|c| c.band).collect(),
            RenderMode::Mono { channel, .. } => vec![channel.band],
            RenderMode::ColorMap { band, .. } | RenderMode::Enhance { band } => vec![*band],
            _ => Vec::new(),
        }
    }
}

/// How a request is rendered: output shape, pixel transform and relief.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub format: OutputFormat,
    pub mode: RenderMode,
    pub relief: Option<ShadedRelief>,
}

fn is_band_selectable(coverage: &Coverage) -> bool {
    matches!(coverage.sample_type(), SampleType::UInt8 | SampleType::UInt16)
        && matches!(coverage.pixel_type(), PixelType::Rgb | PixelType::Multiband)
}

impl RenderPlan {
    /// Passthrough plan for an unstyled request.
    pub fn passthrough(coverage: &Coverage) -> Self {
        Self {
            format: OutputFormat::of(coverage),
            mode: RenderMode::Passthrough,
            relief: None,
        }
    }

    /// Decide the output format and pixel transform. Fails with
    /// `InvalidBandSelection` for selections the coverage cannot serve.
    pub fn resolve(coverage: &Coverage, style: Option<&RasterStyle>) -> RasterResult<Self> {
        let Some(style) = style else {
            return Ok(Self::passthrough(coverage));
        };

        if let Some(selection) = style.band_selection() {
            if !is_band_selectable(coverage) {
                return Err(RasterError::invalid_band_selection(format!(
                    "band selection needs a uint8/uint16 RGB or MULTIBAND coverage, '{}' is {} {}",
                    coverage.name(),
                    coverage.sample_type(),
                    coverage.pixel_type()
                )));
            }
            if selection.max_band() >= coverage.num_bands() {
                return Err(RasterError::invalid_band_selection(format!(
                    "band {} requested from coverage '{}' with {} bands",
                    selection.max_band() + 1,
                    coverage.name(),
                    coverage.num_bands()
                )));
            }
        }

        let relief = style.shaded_relief().copied();
        if relief.is_some()
            && !(coverage.pixel_type() == PixelType::DataGrid && coverage.num_bands() == 1)
        {
            return Err(RasterError::invalid_argument(format!(
                "shaded relief needs a single-band DATAGRID coverage, '{}' is {}",
                coverage.name(),
                coverage.pixel_type()
            )));
        }

        let source = coverage.sample_type();
        let single_band = coverage.num_bands() == 1;
        let enhanced = style.has_contrast();

        let (format, mode) = if relief.map_or(false, |r| r.brightness_only) {
            (OutputFormat::GRAY_U8, RenderMode::ReliefOnly)
        } else if let (Some(_), Some(BandSelection::Mono { gray })) =
            (style.color_map(), style.band_selection())
        {
            (
                OutputFormat::RGB_U8,
                RenderMode::ColorMap {
                    band: gray.band,
                    selected: true,
                },
            )
        } else if style.has_color_map() && single_band {
            (
                OutputFormat::RGB_U8,
                RenderMode::ColorMap {
                    band: 0,
                    selected: false,
                },
            )
        } else {
            if style.has_color_map() {
                warn!(
                    style = style.name(),
                    coverage = coverage.name(),
                    "Color map needs a single band; ignoring it"
                );
            }
            match style.band_selection() {
                Some(BandSelection::Triple { red, green, blue }) => {
                    let enhanced = enhanced || source == SampleType::UInt8;
                    let format = if enhanced {
                        OutputFormat::RGB_U8
                    } else {
                        OutputFormat {
                            sample_type: SampleType::UInt16,
                            pixel_type: PixelType::Rgb,
                            num_bands: 3,
                        }
                    };
                    (
                        format,
                        RenderMode::Triple {
                            channels: [*red, *green, *blue],
                            enhanced,
                        },
                    )
                }
                Some(BandSelection::Mono { gray }) => {
                    let enhanced = enhanced || source == SampleType::UInt8;
                    let format = if enhanced {
                        OutputFormat::GRAY_U8
                    } else {
                        OutputFormat {
                            sample_type: SampleType::UInt16,
                            pixel_type: PixelType::DataGrid,
                            num_bands: 1,
                        }
                    };
                    (
                        format,
                        RenderMode::Mono {
                            channel: *gray,
                            enhanced,
                        },
                    )
                }
                None => match coverage.pixel_type() {
                    PixelType::Palette => (OutputFormat::RGB_U8, RenderMode::PaletteExpand),
                    PixelType::DataGrid | PixelType::Grayscale if enhanced => {
                        (OutputFormat::GRAY_U8, RenderMode::Enhance { band: 0 })
                    }
                    PixelType::Rgb if enhanced && is_band_selectable(coverage) => {
                        let channels = [Channel::new(0), Channel::new(1), Channel::new(2)];
                        (
                            OutputFormat::RGB_U8,
                            RenderMode::Triple {
                                channels,
                                enhanced: true,
                            },
                        )
                    }
                    _ => (OutputFormat::of(coverage), RenderMode::Passthrough),
                },
            }
        };

        debug!(
            style = style.name(),
            coverage = coverage.name(),
            mode = ?mode,
            sample_type = %format.sample_type,
            pixel_type = %format.pixel_type,
            "Resolved render plan"
        );

        Ok(Self {
            format,
            mode,
            relief,
        })
    }

    /// Whether the plan reads coverage band statistics.
    pub fn needs_statistics(&self, style: Option<&RasterStyle>) -> bool {
        match self.mode {
            RenderMode::Triple { enhanced, .. } | RenderMode::Mono { enhanced, .. } => {
                enhanced && style.map_or(false, RasterStyle::has_contrast)
            }
            RenderMode::Enhance { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{Palette, Rgb};

    fn coverage(sample: SampleType, pixel: PixelType, bands: u8) -> Coverage {
        Coverage::new("c", sample, pixel, bands, 16, 16, 1.0, 1.0).unwrap()
    }

    fn style(xml: &str) -> RasterStyle {
        RasterStyle::from_xml_str(xml, Some("s")).unwrap()
    }

    const TRIPLE: &str = r#"<RasterSymbolizer><ChannelSelection>
        <RedChannel><SourceChannelName>3</SourceChannelName></RedChannel>
        <GreenChannel><SourceChannelName>2</SourceChannelName></GreenChannel>
        <BlueChannel><SourceChannelName>1</SourceChannelName></BlueChannel>
    </ChannelSelection></RasterSymbolizer>"#;

    const MONO_WITH_GAMMA: &str = r#"<RasterSymbolizer><ChannelSelection>
        <GrayChannel><SourceChannelName>2</SourceChannelName></GrayChannel>
    </ChannelSelection><ContrastEnhancement><GammaValue>2</GammaValue></ContrastEnhancement>
    </RasterSymbolizer>"#;

    const COLOR_MAP: &str = r##"<RasterSymbolizer><ColorMap><Categorize>
        <Value>#000000</Value><Threshold>10</Threshold><Value>#FF0000</Value>
    </Categorize></ColorMap></RasterSymbolizer>"##;

    #[test]
    fn test_unstyled_is_passthrough() {
        let c = coverage(SampleType::Float32, PixelType::DataGrid, 1);
        let plan = RenderPlan::resolve(&c, None).unwrap();
        assert_eq!(plan.mode, RenderMode::Passthrough);
        assert_eq!(plan.format, OutputFormat::of(&c));
    }

    #[test]
    fn test_triple_output_depth() {
        let s = style(TRIPLE);
        let u16_source = coverage(SampleType::UInt16, PixelType::Multiband, 4);
        let format = OutputFormat::resolve(&u16_source, Some(&s)).unwrap();
        assert_eq!(format.sample_type, SampleType::UInt16);
        assert_eq!(format.pixel_type, PixelType::Rgb);

        let u8_source = coverage(SampleType::UInt8, PixelType::Multiband, 4);
        assert_eq!(
            OutputFormat::resolve(&u8_source, Some(&s)).unwrap(),
            OutputFormat::RGB_U8
        );
    }

    #[test]
    fn test_mono_with_enhancement_is_gray_u8() {
        let s = style(MONO_WITH_GAMMA);
        let c = coverage(SampleType::UInt16, PixelType::Multiband, 4);
        let plan = RenderPlan::resolve(&c, Some(&s)).unwrap();
        assert_eq!(plan.format, OutputFormat::GRAY_U8);
        assert!(plan.mode.is_band_selection());
    }

    #[test]
    fn test_band_out_of_range() {
        let s = style(TRIPLE);
        let c = coverage(SampleType::UInt16, PixelType::Multiband, 2);
        assert!(matches!(
            RenderPlan::resolve(&c, Some(&s)),
            Err(RasterError::InvalidBandSelection(_))
        ));
    }

    #[test]
    fn test_selection_needs_integer_multiband() {
        let s = style(TRIPLE);
        let c = coverage(SampleType::Float32, PixelType::DataGrid, 1);
        assert!(matches!(
            RenderPlan::resolve(&c, Some(&s)),
            Err(RasterError::InvalidBandSelection(_))
        ));
    }

    #[test]
    fn test_color_map_on_single_band() {
        let s = style(COLOR_MAP);
        let c = coverage(SampleType::Int16, PixelType::DataGrid, 1);
        let plan = RenderPlan::resolve(&c, Some(&s)).unwrap();
        assert_eq!(plan.format, OutputFormat::RGB_U8);
        assert_eq!(
            plan.mode,
            RenderMode::ColorMap {
                band: 0,
                selected: false
            }
        );
        assert!(!plan.mode.is_band_selection());
    }

    #[test]
    fn test_color_map_on_multiband_is_ignored() {
        let s = style(COLOR_MAP);
        let c = coverage(SampleType::UInt8, PixelType::Rgb, 3);
        let plan = RenderPlan::resolve(&c, Some(&s)).unwrap();
        assert_eq!(plan.mode, RenderMode::Passthrough);
    }

    #[test]
    fn test_styled_palette_expands() {
        let s = style("<RasterSymbolizer><Opacity>1</Opacity></RasterSymbolizer>");
        let c = coverage(SampleType::UInt8, PixelType::Palette, 1)
            .with_palette(Palette::new(vec![Rgb::BLACK, Rgb::WHITE]).unwrap())
            .unwrap();
        let plan = RenderPlan::resolve(&c, Some(&s)).unwrap();
        assert_eq!(plan.mode, RenderMode::PaletteExpand);
        assert_eq!(plan.format, OutputFormat::RGB_U8);
    }

    #[test]
    fn test_relief_needs_datagrid() {
        let s = style("<RasterSymbolizer><ShadedRelief/></RasterSymbolizer>");
        let c = coverage(SampleType::UInt8, PixelType::Grayscale, 1);
        assert!(RenderPlan::resolve(&c, Some(&s)).is_err());

        let dem = coverage(SampleType::Float32, PixelType::DataGrid, 1);
        let plan = RenderPlan::resolve(&dem, Some(&s)).unwrap();
        assert!(plan.relief.is_some());
        assert_eq!(plan.mode, RenderMode::Passthrough);
    }
}
