//! Contrast enhancement of single samples into 8-bit output.

use raster_common::{BandStatistics, SampleType};
use raster_style::ContrastEnhancement;

/// Maps source samples of one band onto 0..=255.
///
/// NORMALIZE and HISTOGRAM need band statistics; without them they fall
/// back to the plain 8-bit reduction.
#[derive(Debug, Clone)]
pub struct ChannelEnhancer {
    method: ContrastEnhancement,
    sample_type: SampleType,
    stats: Option<BandStatistics>,
    /// Cumulative histogram, normalised to [0, 1].
    cdf: Vec<f64>,
}

impl ChannelEnhancer {
    pub fn new(
        method: ContrastEnhancement,
        sample_type: SampleType,
        stats: Option<&BandStatistics>,
    ) -> Self {
        let stats = stats.filter(|s| s.max >= s.min).cloned();
        let cdf = match (&method, &stats) {
            (ContrastEnhancement::Histogram, Some(s)) => cumulative(&s.histogram),
            _ => Vec::new(),
        };
        Self {
            method,
            sample_type,
            stats,
            cdf,
        }
    }

    pub fn method(&self) -> ContrastEnhancement {
        self.method
    }

    /// Enhance one sample.
    pub fn apply(&self, value: f64) -> u8 {
        match self.method {
            ContrastEnhancement::None => self.reduce(value),
            ContrastEnhancement::Normalize => match &self.stats {
                Some(s) => stretch(value, s.min, s.max),
                None => self.reduce(value),
            },
            ContrastEnhancement::Histogram => match &self.stats {
                Some(s) if !self.cdf.is_empty() => {
                    let bin = s.bin(value).min(self.cdf.len() - 1);
                    (self.cdf[bin] * 255.0).clamp(0.0, 255.0) as u8
                }
                _ => self.reduce(value),
            },
            ContrastEnhancement::Gamma(gamma) => {
                let base = self.reduce(value) as f64;
                gamma_correct(base, gamma)
            }
        }
    }

    /// Plain reduction to 8 bits: u8 as is, u16 scaled by 255/65535 and
    /// truncated, other types stretched over their statistics when known.
    fn reduce(&self, value: f64) -> u8 {
        match self.sample_type.container() {
            SampleType::UInt8 => value.clamp(0.0, 255.0) as u8,
            SampleType::UInt16 => (value / 65535.0 * 255.0).clamp(0.0, 255.0) as u8,
            _ => match &self.stats {
                Some(s) => stretch(value, s.min, s.max),
                None => value.clamp(0.0, 255.0) as u8,
            },
        }
    }
}

/// `255 · (v/255)^(1/gamma)`, truncated.
pub fn gamma_correct(value: f64, gamma: f64) -> u8 {
    if gamma <= 0.0 {
        return value.clamp(0.0, 255.0) as u8;
    }
    let normalised = (value / 255.0).clamp(0.0, 1.0);
    (255.0 * normalised.powf(1.0 / gamma)) as u8
}

/// Linear stretch of [min, max] onto [0, 255], truncated.
fn stretch(value: f64, min: f64, max: f64) -> u8 {
    let range = max - min;
    if range <= 0.0 || value.is_nan() {
        return 0;
    }
    ((value - min) / range * 255.0).clamp(0.0, 255.0) as u8
}

fn cumulative(histogram: &[f64]) -> Vec<f64> {
    let total: f64 = histogram.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let mut running = 0.0;
    histogram
        .iter()
        .map(|&count| {
            running += count;
            running / total
        })
        .collect()
}
