// Copyright (c) 2025 The edgescope developers
// See LICENSE file in root directory for license terms.

use std::time::Instant;

use image::GrayImage;
use log::debug;

use crate::detector::DetectedCircle;

/// Angularly averaged intensity as a function of signed radial offset from a
/// circle's center.
///
/// Offsets at which none of the angular samples fall within the image are
/// omitted, so `values` can be shorter than `2 * radius + 1`; `offsets[i]` is
/// the radial offset at which `values[i]` was measured.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RadialProfile {
    pub offsets: Vec<i32>,
    pub values: Vec<f64>,
}

impl RadialProfile {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True if no offset in [-radius, radius] was omitted.
    pub fn is_contiguous(&self, radius: u32) -> bool {
        self.values.len() == 2 * radius as usize + 1
    }
}

/// Samples the intensity along the circle of radius |r| around the circle's
/// center, once per degree, for each integer offset r in [-radius, radius].
/// Sample positions are truncated toward zero to integer pixel coordinates.
/// Only in-bounds samples contribute to an offset's mean.
pub fn radial_profile(image: &GrayImage, circle: &DetectedCircle) -> RadialProfile {
    let profile_start = Instant::now();
    let (width, height) = image.dimensions();
    let radius = circle.radius as i32;
    let cx = circle.center.x as f64;
    let cy = circle.center.y as f64;

    // Angles are shared by every offset.
    let directions: Vec<(f64, f64)> = (0..360)
        .map(|deg| (deg as f64).to_radians())
        .map(|theta| (theta.cos(), theta.sin()))
        .collect();

    let mut profile = RadialProfile::default();
    for r in -radius..=radius {
        let mut sum = 0_u64;
        let mut count = 0_u32;
        for &(cos, sin) in &directions {
            let x = (cx + r as f64 * cos) as i64;
            let y = (cy + r as f64 * sin) as i64;
            if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                continue;
            }
            sum += image.get_pixel(x as u32, y as u32).0[0] as u64;
            count += 1;
        }
        if count > 0 {
            profile.offsets.push(r);
            profile.values.push(sum as f64 / count as f64);
        }
    }
    debug!("Radial profile of {} offsets ({} omitted) in {:?}",
           profile.len(), 2 * radius as usize + 1 - profile.len(),
           profile_start.elapsed());
    profile
}

/// First difference of an edge profile: `out[i] = profile[i+1] - profile[i]`.
/// Profiles with fewer than two entries yield an empty curve.
pub fn response_curve(edge_profile: &[f64]) -> Vec<f64> {
    edge_profile.windows(2).map(|w| w[1] - w[0]).collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use image::Luma;
    use imageproc::gray_image;
    use super::*;

    #[test]
    fn test_response_curve() {
        assert!(response_curve(&[]).is_empty());
        assert!(response_curve(&[4.0]).is_empty());
        assert_eq!(response_curve(&[1.0, 4.0, 2.5, 2.5]), vec![3.0, -1.5, 0.0]);
    }

    #[test]
    fn test_radial_profile_zero_radius() {
        let image_3x3 = gray_image!(
            0, 1, 2;
            3, 40, 5;
            6, 7, 8);
        let profile = radial_profile(&image_3x3, &DetectedCircle::new(1, 1, 0));
        assert_eq!(profile.offsets, vec![0]);
        assert_eq!(profile.values, vec![40.0]);
    }

    #[test]
    fn test_radial_profile_center_outside_image() {
        let image = GrayImage::from_pixel(10, 10, Luma([50_u8]));
        let profile = radial_profile(&image, &DetectedCircle::new(-5, 3, 0));
        assert!(profile.is_empty());
        let profile = radial_profile(&image, &DetectedCircle::new(100, 100, 3));
        assert!(profile.is_empty());
    }

    #[test]
    fn test_radial_profile_interior_circle_is_contiguous() {
        let image = GrayImage::from_fn(40, 40, |x, y| Luma([(x + y) as u8]));
        let circle = DetectedCircle::new(20, 20, 10);
        let profile = radial_profile(&image, &circle);
        assert!(profile.is_contiguous(10));
        assert_eq!(profile.len(), 21);
        assert_eq!(profile.offsets.first(), Some(&-10));
        assert_eq!(profile.offsets.last(), Some(&10));
        // Opposite offsets sample the same ring (with truncation differences
        // of at most one pixel per axis).
        assert_abs_diff_eq!(profile.values[0], profile.values[20], epsilon = 2.0);
        assert_eq!(profile.values[10], 40.0);
    }

    #[test]
    fn test_radial_profile_step_edge() {
        // Bright disk of radius 8: inner offsets are bright, outer dark.
        let image = GrayImage::from_fn(41, 41, |x, y| {
            let dx = x as f64 - 20.0;
            let dy = y as f64 - 20.0;
            if dx.hypot(dy) <= 8.0 { Luma([200_u8]) } else { Luma([10_u8]) }
        });
        let profile = radial_profile(&image, &DetectedCircle::new(20, 20, 15));
        assert_eq!(profile.len(), 31);
        assert_eq!(profile.values[15], 200.0);  // r = 0.
        assert_eq!(profile.values[30], 10.0);   // r = 15.
        assert_eq!(profile.values[0], 10.0);    // r = -15.
        let response = response_curve(&profile.values);
        // Strongest falling step is on the positive side of the center.
        let (argmin, _) = response.iter().enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1)).unwrap();
        let offset = profile.offsets[argmin];
        assert!(offset >= 6 && offset <= 9, "offset {}", offset);
    }

    #[test]
    fn test_radial_profile_corner_excludes_out_of_bounds() {
        // Center at the corner; three quarters of every ring lie outside.
        let image = GrayImage::from_pixel(30, 30, Luma([100_u8]));
        let circle = DetectedCircle::new(0, 0, 50);
        let profile = radial_profile(&image, &circle);
        // Out-of-bounds samples do not drag the mean toward zero.
        for value in &profile.values {
            assert_eq!(*value, 100.0);
        }
        // Offsets whose rings miss the image entirely are omitted.
        assert!(profile.len() < 101);
        for offset in &profile.offsets {
            assert!(offset.abs() <= 42, "offset {}", offset);
        }
        assert_eq!(profile.offsets.len(), profile.values.len());
    }
}  // mod tests.
