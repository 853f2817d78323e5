//! `RasterSymbolizer` parser.
//!
//! Optional parts degrade to their defaults when they cannot be read. Only
//! required structure that is missing or contradicts itself (a malformed
//! channel selection, a color map with no usable body) fails the whole parse.

use tracing::{debug, warn};

use raster_common::{RasterError, RasterResult, Rgb};

use crate::color_map::{CategorizeMap, ColorMap, ColorMapEntry, InterpolateMap};
use crate::model::{
    BandSelection, Channel, ContrastEnhancement, RasterStyle, ShadedRelief, DEFAULT_RELIEF_FACTOR,
};
use crate::xml::{QuickXmlProvider, XmlElement, XmlTreeProvider};

/// Wrapper elements searched on the way down to the symbolizer.
const WRAPPERS: [&str; 3] = ["CoverageStyle", "FeatureTypeStyle", "Rule"];

/// Parse a raster style from an element tree.
///
/// `name`, `title` and `abstract_text` override the document's own
/// `Name` and `Description` elements. A style without any name is malformed.
pub fn parse_raster_style(
    root: &XmlElement,
    name: Option<&str>,
    title: Option<&str>,
    abstract_text: Option<&str>,
) -> RasterResult<RasterStyle> {
    let description = root.child("Description");
    let name = name
        .map(str::to_string)
        .or_else(|| root.child_text("Name"))
        .unwrap_or_default();
    if name.trim().is_empty() {
        return Err(RasterError::malformed("raster style requires a name"));
    }
    let title = title
        .map(str::to_string)
        .or_else(|| description.and_then(|d| d.child_text("Title")));
    let abstract_text = abstract_text
        .map(str::to_string)
        .or_else(|| description.and_then(|d| d.child_text("Abstract")));

    let symbolizer = find_raster_symbolizer(root)
        .ok_or_else(|| RasterError::malformed("no RasterSymbolizer found"))?;

    let opacity = parse_opacity(symbolizer);
    let band_selection = match symbolizer.child("ChannelSelection") {
        Some(node) => Some(parse_channel_selection(node)?),
        None => None,
    };
    let contrast = symbolizer
        .child("ContrastEnhancement")
        .map(parse_contrast_enhancement)
        .unwrap_or_default();
    let color_map = match symbolizer.child("ColorMap") {
        Some(node) => parse_color_map(node)?,
        None => None,
    };
    let shaded_relief = symbolizer.child("ShadedRelief").map(parse_shaded_relief);

    debug!(
        style = %name,
        opacity,
        band_selection = band_selection.is_some(),
        color_map = color_map.is_some(),
        shaded_relief = shaded_relief.is_some(),
        "Parsed raster style"
    );

    Ok(RasterStyle {
        name,
        title,
        abstract_text,
        opacity,
        band_selection,
        contrast,
        color_map,
        shaded_relief,
    })
}

impl RasterStyle {
    /// Parse a serialized document with the quick-xml tree provider.
    pub fn from_xml_str(xml: &str, name: Option<&str>) -> RasterResult<Self> {
        let root = QuickXmlProvider.parse_str(xml)?;
        parse_raster_style(&root, name, None, None)
    }
}

/// Depth-first search through style wrappers; the first symbolizer wins.
fn find_raster_symbolizer(node: &XmlElement) -> Option<&XmlElement> {
    if node.name == "RasterSymbolizer" {
        return Some(node);
    }
    for child in node.elements() {
        if child.name == "RasterSymbolizer" {
            return Some(child);
        }
        if WRAPPERS.contains(&child.name.as_str()) {
            if let Some(found) = find_raster_symbolizer(child) {
                return Some(found);
            }
        }
    }
    None
}

fn parse_opacity(symbolizer: &XmlElement) -> f64 {
    let Some(text) = symbolizer.child_text("Opacity") else {
        return 1.0;
    };
    match text.parse::<f64>() {
        Ok(v) if (0.0..=1.0).contains(&v) => v,
        _ => {
            warn!(opacity = %text, "Ignoring invalid Opacity, using 1.0");
            1.0
        }
    }
}

fn parse_channel_selection(node: &XmlElement) -> RasterResult<BandSelection> {
    let names: Vec<&str> = node.elements().map(|e| e.name.as_str()).collect();

    let channel = |name: &str| -> RasterResult<Channel> {
        let element = node
            .child(name)
            .ok_or_else(|| RasterError::malformed(format!("missing {}", name)))?;
        parse_channel(element)
    };

    let mut sorted = names.clone();
    sorted.sort_unstable();
    match sorted.as_slice() {
        ["BlueChannel", "GreenChannel", "RedChannel"] => Ok(BandSelection::Triple {
            red: channel("RedChannel")?,
            green: channel("GreenChannel")?,
            blue: channel("BlueChannel")?,
        }),
        ["GrayChannel"] => {
            let mut gray = channel("GrayChannel")?;
            if let ContrastEnhancement::Gamma(g) = gray.contrast {
                gray.contrast = ContrastEnhancement::Gamma(g.clamp(0.0, 1.0));
            }
            Ok(BandSelection::Mono { gray })
        }
        _ => Err(RasterError::malformed(format!(
            "ChannelSelection must hold Red/Green/Blue or a single Gray channel, found {:?}",
            names
        ))),
    }
}

fn parse_channel(node: &XmlElement) -> RasterResult<Channel> {
    let source = node
        .child_text("SourceChannelName")
        .ok_or_else(|| RasterError::malformed(format!("{} without SourceChannelName", node.name)))?;
    let band = parse_band_index(&source)?;
    let contrast = node
        .child("ContrastEnhancement")
        .map(parse_contrast_enhancement)
        .unwrap_or_default();
    Ok(Channel::new(band).with_contrast(contrast))
}

/// Resolve a `SourceChannelName` to a 0-based band index.
///
/// Accepts a 1-based number (`"3"`) or the `"Band.bandN"` form.
pub(crate) fn parse_band_index(source: &str) -> RasterResult<u8> {
    let digits = source.strip_prefix("Band.band").unwrap_or(source);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RasterError::malformed(format!(
            "unrecognized SourceChannelName '{}'",
            source
        )));
    }

    let one_based: u64 = digits
        .parse()
        .map_err(|_| RasterError::malformed(format!("band number out of range: '{}'", source)))?;
    one_based
        .checked_sub(1)
        .and_then(|i| u8::try_from(i).ok())
        .ok_or_else(|| RasterError::malformed(format!("band number out of range: '{}'", source)))
}

fn parse_contrast_enhancement(node: &XmlElement) -> ContrastEnhancement {
    for child in node.elements() {
        match child.name.as_str() {
            "Normalize" => return ContrastEnhancement::Normalize,
            "Histogram" => return ContrastEnhancement::Histogram,
            "GammaValue" => match child.text().parse::<f64>() {
                Ok(g) if g > 0.0 && g.is_finite() => return ContrastEnhancement::Gamma(g),
                _ => warn!(gamma = %child.text(), "Ignoring invalid GammaValue"),
            },
            _ => {}
        }
    }
    ContrastEnhancement::None
}

fn parse_color(text: &str, context: &str) -> Option<Rgb> {
    let color = Rgb::from_hex(text.trim());
    if color.is_none() {
        warn!(color = %text, context, "Not a #RRGGBB color");
    }
    color
}

fn parse_fallback(node: &XmlElement) -> Option<Rgb> {
    match node.attr("fallbackValue") {
        Some(text) => parse_color(text, "fallbackValue"),
        None => Some(Rgb::BLACK),
    }
}

/// A color map whose colors cannot be read is dropped with a warning; the
/// rest of the style still applies. Structural errors stay fatal.
fn parse_color_map(node: &XmlElement) -> RasterResult<Option<ColorMap>> {
    let categorize = node.child("Categorize");
    let interpolate = node.child("Interpolate");
    let map = match (categorize, interpolate) {
        (Some(c), None) => parse_categorize(c)?.map(ColorMap::Categorize),
        (None, Some(i)) => parse_interpolate(i).map(ColorMap::Interpolate),
        (Some(_), Some(_)) => {
            return Err(RasterError::malformed(
                "ColorMap holds both Categorize and Interpolate",
            ))
        }
        (None, None) => {
            return Err(RasterError::malformed(
                "ColorMap requires Categorize or Interpolate",
            ))
        }
    };
    if map.is_none() {
        warn!("Dropping ColorMap with unreadable colors");
    }
    Ok(map)
}

fn parse_categorize(node: &XmlElement) -> RasterResult<Option<CategorizeMap>> {
    let mut unreadable = false;
    let default_color = parse_fallback(node).unwrap_or_else(|| {
        unreadable = true;
        Rgb::BLACK
    });
    let mut base_color: Option<Rgb> = None;
    // Thresholds awaiting their color from the next Value.
    let mut pending: Option<f64> = None;
    let mut breakpoints = Vec::new();

    for child in node.elements() {
        match child.name.as_str() {
            "Value" => {
                let color = parse_color(&child.text(), "Categorize/Value").unwrap_or_else(|| {
                    unreadable = true;
                    Rgb::BLACK
                });
                if let Some(threshold) = pending.take() {
                    breakpoints.push(ColorMapEntry::new(threshold, color));
                } else if base_color.is_none() && breakpoints.is_empty() {
                    base_color = Some(color);
                } else {
                    return Err(RasterError::malformed(
                        "Categorize/Value without a preceding Threshold",
                    ));
                }
            }
            "Threshold" => {
                if pending.is_some() {
                    return Err(RasterError::malformed("consecutive Categorize thresholds"));
                }
                let text = child.text();
                let threshold = text.parse::<f64>().map_err(|_| {
                    RasterError::malformed(format!("Threshold '{}' is not a number", text))
                })?;
                pending = Some(threshold);
            }
            _ => {}
        }
    }

    if pending.is_some() {
        return Err(RasterError::malformed("Categorize ends with a Threshold"));
    }
    let base_color =
        base_color.ok_or_else(|| RasterError::malformed("Categorize without a base Value"))?;

    if unreadable {
        return Ok(None);
    }
    Ok(Some(CategorizeMap {
        base_color,
        default_color,
        breakpoints,
    }))
}

fn parse_interpolate(node: &XmlElement) -> Option<InterpolateMap> {
    let default_color = parse_fallback(node)?;
    let mut points = Vec::new();

    for point in node.children_named("InterpolationPoint") {
        let data = point.child_text("Data").and_then(|t| t.parse::<f64>().ok());
        let color = point.child_text("Value").and_then(|t| Rgb::from_hex(&t));
        match (data, color) {
            (Some(value), Some(color)) => points.push(ColorMapEntry::new(value, color)),
            _ => warn!("Skipping incomplete InterpolationPoint"),
        }
    }

    Some(InterpolateMap {
        default_color,
        points,
    })
}

fn parse_shaded_relief(node: &XmlElement) -> ShadedRelief {
    let brightness_only = match node.child_text("BrightnessOnly").as_deref() {
        Some("1") | Some("true") => true,
        Some("0") | Some("false") | None => false,
        Some(other) => {
            warn!(value = %other, "Ignoring invalid BrightnessOnly");
            false
        }
    };
    let relief_factor = match node.child_text("ReliefFactor") {
        Some(text) => match text.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                warn!(value = %text, "Ignoring invalid ReliefFactor");
                DEFAULT_RELIEF_FACTOR
            }
        },
        None => DEFAULT_RELIEF_FACTOR,
    };
    ShadedRelief {
        brightness_only,
        relief_factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_band_index() {
        assert_eq!(parse_band_index("1").unwrap(), 0);
        assert_eq!(parse_band_index("256").unwrap(), 255);
        assert_eq!(parse_band_index("Band.band3").unwrap(), 2);
        assert!(parse_band_index("0").is_err());
        assert!(parse_band_index("257").is_err());
        assert!(parse_band_index("Band.band0").is_err());
        assert!(parse_band_index("red").is_err());
        assert!(parse_band_index("-1").is_err());
        assert!(parse_band_index("99999999999999999999999").is_err());
    }

    #[test]
    fn test_first_symbolizer_wins() {
        let root = XmlElement::new("CoverageStyle").with_child(
            XmlElement::new("Rule")
                .with_child(
                    XmlElement::new("RasterSymbolizer")
                        .with_child(XmlElement::new("Opacity").with_text("0.25")),
                )
                .with_child(
                    XmlElement::new("RasterSymbolizer")
                        .with_child(XmlElement::new("Opacity").with_text("0.75")),
                ),
        );
        let style = parse_raster_style(&root, Some("s"), None, None).unwrap();
        assert_eq!(style.opacity(), 0.25);
    }

    #[test]
    fn test_symbolizer_outside_wrappers_is_not_found() {
        let root = XmlElement::new("CoverageStyle").with_child(
            XmlElement::new("Other").with_child(XmlElement::new("RasterSymbolizer")),
        );
        let result = parse_raster_style(&root, Some("s"), None, None);
        assert!(matches!(result, Err(RasterError::Malformed(_))));
    }
}
