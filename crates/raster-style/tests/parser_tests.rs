//! Tests for RasterSymbolizer parsing.

use raster_common::{RasterError, Rgb};
use raster_style::{
    parse_raster_style, BandSelection, ColorMap, ContrastEnhancement, QuickXmlProvider,
    RasterStyle, XmlTreeProvider,
};
use test_utils::styles;

fn parse(xml: &str) -> Result<RasterStyle, RasterError> {
    test_utils::init_test_tracing();
    RasterStyle::from_xml_str(xml, None)
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn test_minimal_symbolizer_defaults() {
    let style = parse(styles::MINIMAL).unwrap();
    assert_eq!(style.name(), "minimal");
    assert_eq!(style.opacity(), 1.0);
    assert!(style.band_selection().is_none());
    assert!(style.color_map().is_none());
    assert_eq!(style.contrast_enhancement(), ContrastEnhancement::None);
    assert!(!style.has_shaded_relief());
    assert!(!style.has_contrast());
}

#[test]
fn test_name_argument_overrides_document() {
    let root = QuickXmlProvider.parse_str(styles::MINIMAL).unwrap();
    let style = parse_raster_style(&root, Some("custom"), Some("Title"), Some("Abstract")).unwrap();
    assert_eq!(style.name(), "custom");
    assert_eq!(style.title(), Some("Title"));
    assert_eq!(style.abstract_text(), Some("Abstract"));
}

#[test]
fn test_missing_name_is_malformed() {
    let xml = "<CoverageStyle><Rule><RasterSymbolizer/></Rule></CoverageStyle>";
    assert!(matches!(parse(xml), Err(RasterError::Malformed(_))));
    assert!(RasterStyle::from_xml_str(xml, Some("named")).is_ok());
}

#[test]
fn test_symbolizer_as_root() {
    let style = RasterStyle::from_xml_str(
        "<RasterSymbolizer><Opacity>0.3</Opacity></RasterSymbolizer>",
        Some("bare"),
    )
    .unwrap();
    assert_eq!(style.opacity(), 0.3);
}

#[test]
fn test_invalid_opacity_keeps_default() {
    for text in ["abc", "1.5", "-0.1"] {
        let xml = format!(
            "<RasterSymbolizer><Opacity>{}</Opacity></RasterSymbolizer>",
            text
        );
        let style = RasterStyle::from_xml_str(&xml, Some("s")).unwrap();
        assert_eq!(style.opacity(), 1.0, "opacity text {:?}", text);
    }
}

// ============================================================================
// Channel selection
// ============================================================================

#[test]
fn test_triple_band_selection() {
    let style = parse(styles::TRIPLE_BAND).unwrap();
    assert_eq!(style.name(), "false_color");
    assert_eq!(style.title(), Some("False color"));
    assert_eq!(style.abstract_text(), Some("NIR, red and green as RGB"));
    assert_eq!(style.opacity(), 0.8);

    match style.band_selection() {
        Some(BandSelection::Triple { red, green, blue }) => {
            assert_eq!(red.band, 2);
            assert_eq!(red.contrast, ContrastEnhancement::None);
            assert_eq!(green.band, 1);
            assert_eq!(green.contrast, ContrastEnhancement::Normalize);
            assert_eq!(blue.band, 0);
            assert_eq!(blue.contrast, ContrastEnhancement::Gamma(1.5));
        }
        other => panic!("expected triple selection, got {:?}", other),
    }
    assert!(style.has_contrast());
}

#[test]
fn test_mono_gamma_is_clamped() {
    let style = parse(styles::MONO_GAMMA).unwrap();
    match style.band_selection() {
        Some(BandSelection::Mono { gray }) => {
            assert_eq!(gray.band, 3);
            assert_eq!(gray.contrast, ContrastEnhancement::Gamma(1.0));
        }
        other => panic!("expected mono selection, got {:?}", other),
    }
}

#[test]
fn test_partial_triple_is_malformed() {
    let xml = r#"<RasterSymbolizer><ChannelSelection>
        <RedChannel><SourceChannelName>1</SourceChannelName></RedChannel>
        <GreenChannel><SourceChannelName>2</SourceChannelName></GreenChannel>
    </ChannelSelection></RasterSymbolizer>"#;
    assert!(matches!(
        RasterStyle::from_xml_str(xml, Some("s")),
        Err(RasterError::Malformed(_))
    ));
}

#[test]
fn test_gray_mixed_with_rgb_is_malformed() {
    let xml = r#"<RasterSymbolizer><ChannelSelection>
        <RedChannel><SourceChannelName>1</SourceChannelName></RedChannel>
        <GreenChannel><SourceChannelName>2</SourceChannelName></GreenChannel>
        <BlueChannel><SourceChannelName>3</SourceChannelName></BlueChannel>
        <GrayChannel><SourceChannelName>4</SourceChannelName></GrayChannel>
    </ChannelSelection></RasterSymbolizer>"#;
    assert!(RasterStyle::from_xml_str(xml, Some("s")).is_err());
}

#[test]
fn test_bad_source_channel_is_malformed() {
    let xml = r#"<RasterSymbolizer><ChannelSelection>
        <GrayChannel><SourceChannelName>Band.band0</SourceChannelName></GrayChannel>
    </ChannelSelection></RasterSymbolizer>"#;
    assert!(RasterStyle::from_xml_str(xml, Some("s")).is_err());
}

// ============================================================================
// Contrast enhancement
// ============================================================================

#[test]
fn test_first_recognized_enhancement_wins() {
    let xml = r#"<RasterSymbolizer><ContrastEnhancement>
        <Unknown/>
        <GammaValue>not-a-number</GammaValue>
        <Histogram/>
        <Normalize/>
    </ContrastEnhancement></RasterSymbolizer>"#;
    let style = RasterStyle::from_xml_str(xml, Some("s")).unwrap();
    assert_eq!(style.contrast_enhancement(), ContrastEnhancement::Histogram);
}

#[test]
fn test_overall_gamma() {
    let style = parse(styles::GAMMA).unwrap();
    assert_eq!(style.contrast_enhancement(), ContrastEnhancement::Gamma(2.0));
    assert_eq!(style.contrast_enhancement().gamma(), 2.0);
}

// ============================================================================
// Color maps
// ============================================================================

#[test]
fn test_categorize_map() {
    let style = parse(styles::CATEGORIZE).unwrap();
    let map = style.color_map().unwrap();
    assert!(map.is_categorize());
    assert_eq!(map.entry_count(), 2);
    assert_eq!(map.default_color(), Rgb::WHITE);

    assert_eq!(map.color_for(5.0), Rgb::BLACK);
    assert_eq!(map.color_for(10.0), Rgb::new(255, 0, 0));
    assert_eq!(map.color_for(15.0), Rgb::new(255, 0, 0));
    assert_eq!(map.color_for(25.0), Rgb::new(0, 255, 0));
}

#[test]
fn test_categorize_keeps_document_order() {
    let xml = r##"<RasterSymbolizer><ColorMap><Categorize>
        <Value>#000000</Value>
        <Threshold>30</Threshold><Value>#0000FF</Value>
        <Threshold>10</Threshold><Value>#FF0000</Value>
    </Categorize></ColorMap></RasterSymbolizer>"##;
    let style = RasterStyle::from_xml_str(xml, Some("s")).unwrap();
    let values: Vec<f64> = style
        .color_map()
        .unwrap()
        .entries()
        .iter()
        .map(|e| e.value)
        .collect();
    assert_eq!(values, vec![30.0, 10.0]);
}

#[test]
fn test_interpolate_map_skips_incomplete_points() {
    let style = parse(styles::INTERPOLATE).unwrap();
    let map = style.color_map().unwrap();
    assert!(matches!(map, ColorMap::Interpolate(_)));
    assert_eq!(map.entry_count(), 2);
    assert_eq!(map.default_color(), Rgb::new(0, 0, 255));

    assert_eq!(map.color_for(50.0), Rgb::new(128, 128, 128));
    assert_eq!(map.color_for(-10.0), Rgb::BLACK);
    assert_eq!(map.color_for(200.0), Rgb::WHITE);
}

#[test]
fn test_empty_color_map_is_malformed() {
    let xml = "<RasterSymbolizer><ColorMap/></RasterSymbolizer>";
    assert!(matches!(
        RasterStyle::from_xml_str(xml, Some("s")),
        Err(RasterError::Malformed(_))
    ));
}

#[test]
fn test_non_literal_color_drops_color_map() {
    test_utils::init_test_tracing();
    let xml = r#"<RasterSymbolizer>
        <Opacity>0.5</Opacity>
        <ColorMap><Categorize>
            <Value>red</Value>
        </Categorize></ColorMap>
    </RasterSymbolizer>"#;
    let style = RasterStyle::from_xml_str(xml, Some("s")).unwrap();
    assert!(!style.has_color_map());
    assert_eq!(style.opacity(), 0.5);
}

#[test]
fn test_bad_fallback_drops_color_map() {
    test_utils::init_test_tracing();
    let xml = r##"<RasterSymbolizer>
        <ChannelSelection>
            <GrayChannel><SourceChannelName>2</SourceChannelName></GrayChannel>
        </ChannelSelection>
        <ColorMap><Interpolate fallbackValue="#12">
            <InterpolationPoint><Data>0</Data><Value>#000000</Value></InterpolationPoint>
        </Interpolate></ColorMap>
    </RasterSymbolizer>"##;
    let style = RasterStyle::from_xml_str(xml, Some("s")).unwrap();
    assert!(style.color_map().is_none());
    assert!(matches!(
        style.band_selection(),
        Some(BandSelection::Mono { .. })
    ));
}

// ============================================================================
// Shaded relief
// ============================================================================

#[test]
fn test_shaded_relief() {
    let style = parse(styles::SHADED_RELIEF).unwrap();
    let relief = style.shaded_relief().unwrap();
    assert!(!relief.brightness_only);
    assert_eq!(relief.relief_factor, 25.5);
    assert!(style.has_color_map());
}

#[test]
fn test_shaded_relief_defaults() {
    let style = parse(styles::BRIGHTNESS_ONLY).unwrap();
    let relief = style.shaded_relief().unwrap();
    assert!(relief.brightness_only);
    assert_eq!(relief.relief_factor, 55.0);
}

// ============================================================================
// Document-level failures
// ============================================================================

#[test]
fn test_ill_formed_xml_is_malformed() {
    let err = parse("<CoverageStyle><Rule></CoverageStyle>").unwrap_err();
    assert!(err.is_recoverable());
}

#[test]
fn test_no_symbolizer_is_malformed() {
    let xml = "<CoverageStyle><Name>x</Name><Rule/></CoverageStyle>";
    assert!(matches!(parse(xml), Err(RasterError::Malformed(_))));
}
