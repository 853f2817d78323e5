//! Color maps: value → display color.
//!
//! Entries are kept in the order the document supplied them. Nothing here
//! sorts: caller-supplied order is trusted, and an out-of-order document is
//! evaluated exactly as written.

use raster_common::Rgb;

/// A (value, color) pair: a breakpoint threshold or an interpolation point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMapEntry {
    pub value: f64,
    pub color: Rgb,
}

impl ColorMapEntry {
    pub fn new(value: f64, color: Rgb) -> Self {
        Self { value, color }
    }
}

/// Discrete classification by thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizeMap {
    /// Color for values below the first threshold.
    pub base_color: Rgb,
    /// Fallback for values that cannot be classified (NaN).
    pub default_color: Rgb,
    /// Thresholds in document order.
    pub breakpoints: Vec<ColorMapEntry>,
}

impl CategorizeMap {
    /// Classify a value.
    ///
    /// Scans breakpoints in stored order for the first one whose threshold
    /// exceeds the value and returns the color of the breakpoint before it
    /// (the base color if that is the first one). When no threshold exceeds
    /// the value the last breakpoint's color applies. A value equal to a
    /// threshold therefore takes that threshold's color.
    pub fn color_for(&self, value: f64) -> Rgb {
        if value.is_nan() {
            return self.default_color;
        }

        let mut current = self.base_color;
        for entry in &self.breakpoints {
            if entry.value > value {
                return current;
            }
            current = entry.color;
        }
        current
    }
}

/// Linear interpolation between control points.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolateMap {
    /// Fallback for NaN or a map without points.
    pub default_color: Rgb,
    /// Control points in document order.
    pub points: Vec<ColorMapEntry>,
}

impl InterpolateMap {
    /// Interpolate a value, clamping to the first/last point outside the range.
    pub fn color_for(&self, value: f64) -> Rgb {
        if value.is_nan() {
            return self.default_color;
        }
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return self.default_color,
        };

        if value <= first.value {
            return first.color;
        }

        for pair in self.points.windows(2) {
            let (low, high) = (&pair[0], &pair[1]);
            if value >= low.value && value <= high.value {
                let span = high.value - low.value;
                if span <= 0.0 {
                    return high.color;
                }
                let t = (value - low.value) / span;
                return lerp(low.color, high.color, t);
            }
        }

        last.color
    }
}

fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let channel = |x: u8, y: u8| -> u8 { ((x as f64) * (1.0 - t) + (y as f64) * t).round() as u8 };
    Rgb::new(channel(a.r, b.r), channel(a.g, b.g), channel(a.b, b.b))
}

/// Either flavor of SE color map.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorMap {
    Categorize(CategorizeMap),
    Interpolate(InterpolateMap),
}

impl ColorMap {
    /// Resolve the display color of a scalar value.
    pub fn color_for(&self, value: f64) -> Rgb {
        match self {
            ColorMap::Categorize(map) => map.color_for(value),
            ColorMap::Interpolate(map) => map.color_for(value),
        }
    }

    pub fn default_color(&self) -> Rgb {
        match self {
            ColorMap::Categorize(map) => map.default_color,
            ColorMap::Interpolate(map) => map.default_color,
        }
    }

    /// Breakpoints or control points, in stored order.
    pub fn entries(&self) -> &[ColorMapEntry] {
        match self {
            ColorMap::Categorize(map) => &map.breakpoints,
            ColorMap::Interpolate(map) => &map.points,
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entries().len()
    }

    pub fn is_categorize(&self) -> bool {
        matches!(self, ColorMap::Categorize(_))
    }
}
