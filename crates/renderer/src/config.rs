//! Configuration for the view renderer.

use serde::{Deserialize, Serialize};

use raster_style::model::DEFAULT_RELIEF_FACTOR;

/// Renderer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Worker threads used by [`crate::Renderer::render_batch`].
    pub max_threads: usize,

    /// Multiplies the horizontal pixel size during slope estimation so it is
    /// expressed in elevation units (e.g. 111120 for degrees over metres).
    pub relief_scale_factor: f64,

    /// Relief exaggeration used when a style does not give one.
    pub default_relief_factor: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_threads: 4,
            relief_scale_factor: 1.0,
            default_relief_factor: DEFAULT_RELIEF_FACTOR,
        }
    }
}

impl RenderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RENDER_MAX_THREADS") {
            if let Ok(n) = val.parse() {
                config.max_threads = n;
            }
        }

        if let Ok(val) = std::env::var("RENDER_RELIEF_SCALE") {
            if let Ok(scale) = val.parse() {
                config.relief_scale_factor = scale;
            }
        }

        if let Ok(val) = std::env::var("RENDER_RELIEF_FACTOR") {
            if let Ok(factor) = val.parse() {
                config.default_relief_factor = factor;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_threads == 0 {
            return Err("max_threads must be > 0".to_string());
        }

        if !(self.relief_scale_factor > 0.0 && self.relief_scale_factor.is_finite()) {
            return Err("relief_scale_factor must be a positive number".to_string());
        }

        if !self.default_relief_factor.is_finite() {
            return Err("default_relief_factor must be finite".to_string());
        }

        Ok(())
    }
}
