// Copyright (c) 2025 The edgescope developers
// See LICENSE file in root directory for license terms.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Parameters of the circle detector. See [crate::detector::find_circles()].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Canny hysteresis thresholds, on the 8-bit intensity scale.
    pub canny_low: f32,
    pub canny_high: f32,

    /// Inverse accumulator resolution: each Hough accumulator cell spans
    /// `resolution` x `resolution` image pixels. Values below 1 are treated
    /// as 1.
    pub resolution: u32,

    /// Minimum distance, in pixels, between the centers of two reported
    /// circles.
    pub min_center_distance: f32,

    /// Minimum Sobel gradient magnitude for an edge pixel to cast votes.
    pub gradient_threshold: f32,

    /// Minimum number of votes for a center, and minimum number of supporting
    /// edge pixels for a radius.
    pub accumulator_threshold: u32,

    /// Radius search bounds. 0 means unbounded.
    pub min_radius: u32,
    pub max_radius: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig{canny_low: 100.0,
                       canny_high: 200.0,
                       resolution: 1,
                       min_center_distance: 20.0,
                       gradient_threshold: 10.0,
                       accumulator_threshold: 10,
                       min_radius: 0,
                       max_radius: 0}
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub detector: DetectorConfig,

    /// Side length of the noise profile ROI, as a fraction of the detected
    /// radius.
    pub noise_roi_scale: f64,

    /// Side length of the signal statistics ROI, as a fraction of the
    /// detected radius. The default 0.5 yields an inner ROI concentric with
    /// and half the size of the noise ROI; 1.0 reuses the noise ROI.
    pub stats_roi_scale: f64,

    /// Gaussian sigma of the blur filter.
    pub blur_sigma: f32,

    /// Parameters of the additive noise filter. The seed makes the filter
    /// reproducible.
    pub noise_stddev: f64,
    pub noise_seed: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig{detector: DetectorConfig::default(),
                       noise_roi_scale: 1.0,
                       stats_roi_scale: 0.5,
                       blur_sigma: 2.0,
                       noise_stddev: 10.0,
                       noise_seed: 42}
    }
}

impl AnalysisConfig {
    /// Reads a JSON configuration file. Omitted fields take their default
    /// values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| {
            ConfigError::Read{path: path.display().to_string(), source}
        })?;
        Self::from_json(&contents).map_err(|e| match e {
            ConfigError::Parse{source, ..} =>
                ConfigError::Parse{path: path.display().to_string(), source},
            other => other,
        })
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(|source| {
            ConfigError::Parse{path: String::from("<string>"), source}
        })
    }
}

// mod tests.
