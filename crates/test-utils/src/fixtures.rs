//! Common test fixtures: style documents and coverage definitions.

use raster_common::{Coverage, Pixel, PixelType, SampleType, SampleValue};

/// SLD/SE documents exercising the raster style parser.
pub mod styles {
    /// A symbolizer with nothing but its wrapper elements.
    pub const MINIMAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CoverageStyle version="1.1.0" xmlns="http://www.opengis.net/se">
    <Name>minimal</Name>
    <Rule>
        <RasterSymbolizer/>
    </Rule>
</CoverageStyle>"#;

    /// False-color composite over a multiband coverage.
    pub const TRIPLE_BAND: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<se:CoverageStyle version="1.1.0" xmlns:se="http://www.opengis.net/se">
    <se:Name>false_color</se:Name>
    <se:Description>
        <se:Title>False color</se:Title>
        <se:Abstract>NIR, red and green as RGB</se:Abstract>
    </se:Description>
    <se:Rule>
        <se:RasterSymbolizer>
            <se:Opacity>0.8</se:Opacity>
            <se:ChannelSelection>
                <se:RedChannel>
                    <se:SourceChannelName>3</se:SourceChannelName>
                </se:RedChannel>
                <se:GreenChannel>
                    <se:SourceChannelName>Band.band2</se:SourceChannelName>
                    <se:ContrastEnhancement>
                        <se:Normalize/>
                    </se:ContrastEnhancement>
                </se:GreenChannel>
                <se:BlueChannel>
                    <se:SourceChannelName>1</se:SourceChannelName>
                    <se:ContrastEnhancement>
                        <se:GammaValue>1.5</se:GammaValue>
                    </se:ContrastEnhancement>
                </se:BlueChannel>
            </se:ChannelSelection>
        </se:RasterSymbolizer>
    </se:Rule>
</se:CoverageStyle>"#;

    /// Plain triple selection of bands 3, 2, 1 (0-based 2, 1, 0).
    pub const TRIPLE_REVERSED: &str = r#"<CoverageStyle>
    <Name>reversed</Name>
    <Rule>
        <RasterSymbolizer>
            <ChannelSelection>
                <RedChannel><SourceChannelName>3</SourceChannelName></RedChannel>
                <GreenChannel><SourceChannelName>2</SourceChannelName></GreenChannel>
                <BlueChannel><SourceChannelName>1</SourceChannelName></BlueChannel>
            </ChannelSelection>
        </RasterSymbolizer>
    </Rule>
</CoverageStyle>"#;

    /// Single band rendered gray with a gamma outside [0, 1].
    pub const MONO_GAMMA: &str = r#"<CoverageStyle>
    <Name>mono</Name>
    <Rule>
        <RasterSymbolizer>
            <ChannelSelection>
                <GrayChannel>
                    <SourceChannelName>Band.band4</SourceChannelName>
                    <ContrastEnhancement>
                        <GammaValue>2.5</GammaValue>
                    </ContrastEnhancement>
                </GrayChannel>
            </ChannelSelection>
        </RasterSymbolizer>
    </Rule>
</CoverageStyle>"#;

    /// Categorize map: below 10 black, [10,20) red, 20+ green, NaN white.
    pub const CATEGORIZE: &str = r##"<CoverageStyle>
    <Name>classes</Name>
    <Rule>
        <RasterSymbolizer>
            <ColorMap>
                <Categorize fallbackValue="#FFFFFF">
                    <LookupValue>Rasterdata</LookupValue>
                    <Value>#000000</Value>
                    <Threshold>10</Threshold>
                    <Value>#FF0000</Value>
                    <Threshold>20</Threshold>
                    <Value>#00FF00</Value>
                </Categorize>
            </ColorMap>
        </RasterSymbolizer>
    </Rule>
</CoverageStyle>"##;

    /// Interpolate map from black at 0 to white at 100.
    pub const INTERPOLATE: &str = r##"<CoverageStyle>
    <Name>ramp</Name>
    <Rule>
        <RasterSymbolizer>
            <ColorMap>
                <Interpolate fallbackValue="#0000FF">
                    <LookupValue>Rasterdata</LookupValue>
                    <InterpolationPoint>
                        <Data>0</Data>
                        <Value>#000000</Value>
                    </InterpolationPoint>
                    <InterpolationPoint>
                        <Data>50</Data>
                    </InterpolationPoint>
                    <InterpolationPoint>
                        <Data>100</Data>
                        <Value>#FFFFFF</Value>
                    </InterpolationPoint>
                </Interpolate>
            </ColorMap>
        </RasterSymbolizer>
    </Rule>
</CoverageStyle>"##;

    /// Hypsometric tint with hill shading.
    pub const SHADED_RELIEF: &str = r##"<CoverageStyle>
    <Name>relief</Name>
    <Rule>
        <RasterSymbolizer>
            <Opacity>1.0</Opacity>
            <ColorMap>
                <Interpolate fallbackValue="#000000">
                    <InterpolationPoint><Data>0</Data><Value>#00A000</Value></InterpolationPoint>
                    <InterpolationPoint><Data>1000</Data><Value>#C0A080</Value></InterpolationPoint>
                </Interpolate>
            </ColorMap>
            <ShadedRelief>
                <BrightnessOnly>0</BrightnessOnly>
                <ReliefFactor>25.5</ReliefFactor>
            </ShadedRelief>
        </RasterSymbolizer>
    </Rule>
</CoverageStyle>"##;

    /// Relief rendered on its own as a gray image.
    pub const BRIGHTNESS_ONLY: &str = r#"<CoverageStyle>
    <Name>hillshade</Name>
    <Rule>
        <RasterSymbolizer>
            <ShadedRelief>
                <BrightnessOnly>1</BrightnessOnly>
            </ShadedRelief>
        </RasterSymbolizer>
    </Rule>
</CoverageStyle>"#;

    /// Overall gamma correction.
    pub const GAMMA: &str = r#"<CoverageStyle>
    <Name>gamma</Name>
    <Rule>
        <RasterSymbolizer>
            <ContrastEnhancement>
                <GammaValue>2.0</GammaValue>
            </ContrastEnhancement>
        </RasterSymbolizer>
    </Rule>
</CoverageStyle>"#;

    /// Overall normalize stretch.
    pub const NORMALIZE: &str = r#"<CoverageStyle>
    <Name>stretch</Name>
    <Rule>
        <RasterSymbolizer>
            <ContrastEnhancement>
                <Normalize/>
            </ContrastEnhancement>
        </RasterSymbolizer>
    </Rule>
</CoverageStyle>"#;

    /// Three layers, one of them missing its Name.
    pub const GROUP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<StyledLayerDescriptor version="1.1.0" xmlns="http://www.opengis.net/sld">
    <Name>basemap</Name>
    <Description>
        <Title>Base map</Title>
    </Description>
    <NamedLayer>
        <Name>dem</Name>
        <NamedStyle><Name>relief</Name></NamedStyle>
    </NamedLayer>
    <NamedLayer>
        <NamedStyle><Name>orphan</Name></NamedStyle>
    </NamedLayer>
    <NamedLayer>
        <Name>ortho</Name>
    </NamedLayer>
</StyledLayerDescriptor>"#;
}

/// Single-band float elevation coverage, 1 m pixels, NODATA -9999.
pub fn dem_coverage(tile_size: u32) -> Coverage {
    Coverage::new(
        "dem",
        SampleType::Float32,
        PixelType::DataGrid,
        1,
        tile_size,
        tile_size,
        1.0,
        1.0,
    )
    .and_then(|c| c.with_no_data(Pixel::datagrid(SampleValue::Float32(-9999.0))?))
    .expect("valid DEM coverage")
}

/// 8-bit RGB coverage with 1 unit pixels.
pub fn rgb_coverage(tile_size: u32) -> Coverage {
    Coverage::new(
        "ortho",
        SampleType::UInt8,
        PixelType::Rgb,
        3,
        tile_size,
        tile_size,
        1.0,
        1.0,
    )
    .expect("valid RGB coverage")
}

/// 16-bit multiband coverage with 1 unit pixels.
pub fn multiband_u16_coverage(bands: u8, tile_size: u32) -> Coverage {
    Coverage::new(
        "sentinel",
        SampleType::UInt16,
        PixelType::Multiband,
        bands,
        tile_size,
        tile_size,
        1.0,
        1.0,
    )
    .expect("valid multiband coverage")
}

/// 8-bit multiband coverage with 1 unit pixels.
pub fn multiband_u8_coverage(bands: u8, tile_size: u32) -> Coverage {
    Coverage::new(
        "landsat",
        SampleType::UInt8,
        PixelType::Multiband,
        bands,
        tile_size,
        tile_size,
        1.0,
        1.0,
    )
    .expect("valid multiband coverage")
}
