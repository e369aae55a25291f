// Copyright (c) 2025 The edgescope developers
// See LICENSE file in root directory for license terms.

use std::time::Instant;

use image::GrayImage;
use imageproc::point::Point;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::detector::{detect, DetectedCircle};
use crate::error::{AnalysisError, Recovery, RoiStage};
use crate::noise::{noise_profile, noise_region};
use crate::profile::{radial_profile, response_curve};
use crate::statistics::{region_statistics, SignalStatistics};

/// Everything measured about one circular feature. Produced as a whole by
/// [analyze()] or [analyze_circle()]; never updated in place.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisResult {
    /// Angularly averaged intensity per radial offset. See
    /// [crate::profile::RadialProfile] regarding omitted offsets.
    pub edge_profile: Vec<f64>,

    /// Radial offset of each `edge_profile` entry.
    pub edge_offsets: Vec<i32>,

    /// Per-row RMS residual over the noise ROI, top to bottom.
    pub noise_profile: Vec<f64>,

    pub signal_mean: f64,
    pub noise_std: f64,
    pub cnr: f64,

    pub center: Point<i32>,
    pub radius: u32,

    /// Conditions worked around while producing this result.
    pub recoveries: Vec<Recovery>,
}

impl AnalysisResult {
    /// Discrete derivative of the edge profile. Always consistent with
    /// `edge_profile` since it is derived on demand.
    pub fn response_curve(&self) -> Vec<f64> {
        response_curve(&self.edge_profile)
    }

    pub fn circle(&self) -> DetectedCircle {
        DetectedCircle{center: self.center, radius: self.radius}
    }

    pub fn to_record(&self) -> AnalysisRecord {
        AnalysisRecord{edge_profile: self.edge_profile.clone(),
                       noise_profile: self.noise_profile.clone(),
                       signal_mean: self.signal_mean,
                       noise_std: self.noise_std,
                       cnr: self.cnr,
                       center_x: self.center.x,
                       center_y: self.center.y,
                       radius: self.radius}
    }
}

/// Flat, serializable form of an [AnalysisResult].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub edge_profile: Vec<f64>,
    pub noise_profile: Vec<f64>,
    pub signal_mean: f64,
    pub noise_std: f64,
    pub cnr: f64,
    pub center_x: i32,
    pub center_y: i32,
    pub radius: u32,
}

impl AnalysisRecord {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Runs the measurement stages for a known `circle`. Degenerate circles
/// (zero radius, center outside the image) produce empty profiles and zero
/// statistics rather than failing.
pub fn analyze_circle(image: &GrayImage, circle: &DetectedCircle,
                      config: &AnalysisConfig) -> AnalysisResult {
    let mut recoveries = Vec::<Recovery>::new();

    let profile = radial_profile(image, circle);

    let noise_roi = noise_region(image, circle, config.noise_roi_scale);
    if noise_roi.is_empty() {
        warn!("Noise ROI is empty for {:?}", circle);
        recoveries.push(Recovery::DegenerateRoi{stage: RoiStage::Noise});
    }
    let noise = noise_profile(image, &noise_roi);

    let stats_roi = noise_region(image, circle, config.stats_roi_scale);
    let stats = if stats_roi.is_empty() {
        warn!("Statistics ROI is empty for {:?}", circle);
        recoveries.push(Recovery::DegenerateRoi{stage: RoiStage::Statistics});
        SignalStatistics::default()
    } else {
        region_statistics(image, &stats_roi)
    };
    if stats.division_guarded() {
        warn!("Noise stddev is zero; reporting CNR as 0");
        recoveries.push(Recovery::DivisionGuard);
    }

    AnalysisResult{edge_profile: profile.values,
                   edge_offsets: profile.offsets,
                   noise_profile: noise,
                   signal_mean: stats.signal_mean,
                   noise_std: stats.noise_std,
                   cnr: stats.cnr,
                   center: circle.center,
                   radius: circle.radius,
                   recoveries}
}

/// Locates a circle in `image` and measures it. See [crate::detector::detect()]
/// and [analyze_circle()].
pub fn analyze(image: &GrayImage, config: &AnalysisConfig)
               -> Result<AnalysisResult, AnalysisError> {
    let analyze_start = Instant::now();
    let circle = detect(image, &config.detector)?;
    let result = analyze_circle(image, &circle, config);
    info!("Analyzed circle at ({}, {}) radius {} in {:?}: mean {:.2} stddev {:.2} CNR {:.2}",
          result.center.x, result.center.y, result.radius, analyze_start.elapsed(),
          result.signal_mean, result.noise_std, result.cnr);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use image::Luma;
    use imageproc::noise::gaussian_noise;
    use crate::image_funcs::synthesize_test_image;
    use super::*;

    #[test]
    fn test_synthetic_circle() {
        let image = synthesize_test_image(500, 500, 200);
        let result = analyze(&image, &AnalysisConfig::default()).unwrap();
        assert!((result.center.x - 250).abs() <= 3, "{:?}", result.circle());
        assert!((result.center.y - 250).abs() <= 3, "{:?}", result.circle());
        assert!((result.radius as i32 - 200).abs() <= 3, "{:?}", result.circle());
        let radius = result.radius as usize;
        assert_eq!(result.edge_profile.len(), 2 * radius + 1);
        assert_eq!(result.edge_offsets.len(), 2 * radius + 1);

        // Intensity rises monotonically from outside the circle (r = -radius)
        // through the boundary into the interior. Rings sample truncated pixel
        // positions, so allow sub-level jitter on the plateau.
        let boundary_window = &result.edge_profile[0..radius / 4];
        for pair in boundary_window.windows(2) {
            assert!(pair[1] + 0.5 >= pair[0], "{:?}", boundary_window);
        }
        assert!(result.edge_profile[10] - result.edge_profile[0] > 25.0);
        assert!(result.edge_profile[radius] > 250.0);

        // Strongest response lies at the boundary crossing.
        let response = result.response_curve();
        assert_eq!(response.len(), result.edge_profile.len() - 1);
        let (argmax, peak) = response.iter().enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1)).unwrap();
        assert!(*peak > 20.0, "peak {}", peak);
        let offset = result.edge_offsets[argmax];
        assert!((offset + radius as i32).abs() <= 4, "offset {}", offset);

        // The interior is flat after blurring.
        assert_eq!(result.noise_profile.len(), radius);
        assert!(result.noise_profile.iter().all(|&n| n < 1.0));
        assert!(result.signal_mean > 250.0);
        assert_eq!(result.noise_std, 0.0);
        assert_eq!(result.cnr, 0.0);
        assert!(result.recoveries.contains(&Recovery::DivisionGuard));
    }

    #[test]
    fn test_noisy_synthetic_circle() {
        let image = gaussian_noise(&synthesize_test_image(300, 300, 100), 0.0, 4.0, 11);
        let result = analyze(&image, &AnalysisConfig::default()).unwrap();
        assert!((result.center.x - 150).abs() <= 3, "{:?}", result.circle());
        assert!((result.radius as i32 - 100).abs() <= 3, "{:?}", result.circle());
        assert!(result.noise_std > 0.0);
        assert_eq!(result.cnr, result.signal_mean / result.noise_std);
        assert!(result.recoveries.is_empty());
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let image = synthesize_test_image(300, 240, 80);
        let config = AnalysisConfig::default();
        let first = analyze(&image, &config).unwrap();
        let second = analyze(&image, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_record(), second.to_record());
    }

    #[test]
    fn test_uniform_image_not_found() {
        let image = GrayImage::from_pixel(200, 200, Luma([128_u8]));
        assert_eq!(analyze(&image, &AnalysisConfig::default()),
                   Err(AnalysisError::NotFound));
    }

    #[test]
    fn test_degenerate_circle() {
        let image = GrayImage::from_pixel(50, 50, Luma([128_u8]));
        let result = analyze_circle(&image, &DetectedCircle::new(-100, 20, 0),
                                    &AnalysisConfig::default());
        assert!(result.edge_profile.is_empty());
        assert!(result.response_curve().is_empty());
        assert!(result.noise_profile.is_empty());
        assert_eq!(result.cnr, 0.0);
        assert!(result.recoveries.contains(
            &Recovery::DegenerateRoi{stage: RoiStage::Noise}));
        assert!(result.recoveries.contains(
            &Recovery::DegenerateRoi{stage: RoiStage::Statistics}));
    }

    #[test]
    fn test_stats_roi_scale() {
        // Left half 40, right half 200; a wider statistics ROI straddles more of
        // both halves but stays centered, so only the spread changes.
        let image = GrayImage::from_fn(100, 100, |x, _y| {
            if x < 50 { Luma([40_u8]) } else { Luma([200_u8]) }
        });
        let circle = DetectedCircle::new(50, 50, 40);
        let inner = analyze_circle(&image, &circle, &AnalysisConfig::default());
        assert_eq!(inner.signal_mean, 120.0);
        assert_eq!(inner.noise_std, 80.0);
        assert_eq!(inner.noise_profile.len(), 40);
        let uniform = DetectedCircle::new(75, 50, 40);
        let right = analyze_circle(&image, &uniform, &AnalysisConfig::default());
        assert_eq!(right.signal_mean, 200.0);
        let config = AnalysisConfig{stats_roi_scale: 1.0, ..AnalysisConfig::default()};
        let wide = analyze_circle(&image, &uniform, &config);
        // The 40 px ROI at x = 55..95 is still entirely bright.
        assert_eq!(wide.signal_mean, 200.0);
        let config = AnalysisConfig{stats_roi_scale: 1.5, ..AnalysisConfig::default()};
        let wider = analyze_circle(&image, &uniform, &config);
        // 60 px ROI at x = 45..100 (clamped) includes five dark columns.
        assert!(wider.signal_mean < 200.0);
    }

    #[test]
    fn test_record_json_field_names() {
        let image = GrayImage::from_pixel(20, 20, Luma([10_u8]));
        let result = analyze_circle(&image, &DetectedCircle::new(10, 10, 4),
                                    &AnalysisConfig::default());
        let json = result.to_record().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for key in ["edgeProfile", "noiseProfile", "signalMean", "noiseStd", "cnr",
                    "centerX", "centerY", "radius"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["centerX"], 10);
        assert_eq!(value["radius"], 4);
        assert_eq!(value["edgeProfile"].as_array().unwrap().len(), 9);
        let parsed: AnalysisRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result.to_record());
    }
}  // mod tests.
