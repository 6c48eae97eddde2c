//! Editor configuration, loadable from RON.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//!
//! ```ron
//! (
//!     estimator: (sparse_word_secs: 0.45),
//!     timeline: (pixels_per_second: 80.0),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Weights for the duration heuristic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Seconds per glyph of a dense script (Hangul, kana, CJK ideographs).
    pub dense_glyph_secs: f64,
    /// Seconds per word of a sparse script (Latin, Cyrillic, ...).
    pub sparse_word_secs: f64,
}

impl EstimatorConfig {
    /// Weights must be finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("dense_glyph_secs", self.dense_glyph_secs),
            ("sparse_word_secs", self.sparse_word_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "estimator.{name} must be a finite, non-negative number of seconds (got {value})"
                )));
            }
        }
        Ok(())
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            dense_glyph_secs: 0.3,
            sparse_word_secs: 0.5,
        }
    }
}

/// Visual mapping of the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Pixels per second at zoom level 1.0.
    pub pixels_per_second: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl TimelineConfig {
    /// `pixels_per_second` must be finite and positive; zoom bounds must
    /// satisfy `0 < min_zoom <= max_zoom`, both finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Self {
            pixels_per_second,
            min_zoom,
            max_zoom,
        } = *self;
        if !pixels_per_second.is_finite() || pixels_per_second <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "timeline.pixels_per_second must be finite and positive (got {pixels_per_second})"
            )));
        }
        if !min_zoom.is_finite() || !max_zoom.is_finite() || min_zoom <= 0.0 || min_zoom > max_zoom {
            return Err(ConfigError::Invalid(format!(
                "timeline zoom bounds need 0 < min_zoom <= max_zoom (got {min_zoom}..{max_zoom})"
            )));
        }
        Ok(())
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            pixels_per_second: 100.0,
            min_zoom: 0.1,
            max_zoom: 20.0,
        }
    }
}

/// Top-level editor configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub estimator: EstimatorConfig,
    pub timeline: TimelineConfig,
}

impl EditorConfig {
    /// Parse from RON text. The result is validated.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.estimator.validate()?;
        self.timeline.validate()
    }

    /// Read and parse a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_ron_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), ?config, "loaded editor config");
        Ok(config)
    }
}
