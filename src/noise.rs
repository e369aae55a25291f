// Copyright (c) 2025 The edgescope developers
// See LICENSE file in root directory for license terms.

use std::time::Instant;

use image::GrayImage;
use image::imageops::crop_imm;
use imageproc::filter::box_filter;
use log::debug;

use crate::detector::DetectedCircle;
use crate::region::Region;

/// The noise ROI: a square of side `scale * radius` centered on the circle,
/// clamped to the image.
pub fn noise_region(image: &GrayImage, circle: &DetectedCircle, scale: f64) -> Region {
    let (width, height) = image.dimensions();
    let side = (scale * circle.radius as f64).max(0.0) as u32;
    Region::centered_square(circle.center, side, width, height)
}

/// Estimates local noise within `region`, one value per row. The image is
/// smoothed with a 3x3 mean filter; each row's value is the RMS difference
/// between the region and its smoothed version along that row. Smoothing at the
/// region's border reads the image pixels just outside the region; only the
/// image's own border is replicated. An empty region yields an empty profile.
pub fn noise_profile(image: &GrayImage, region: &Region) -> Vec<f64> {
    let noise_start = Instant::now();
    if region.is_empty() {
        return Vec::new();
    }
    let (image_width, image_height) = image.dimensions();
    assert!(region.fits(image_width, image_height),
            "{:?} exceeds {}x{} image", region, image_width, image_height);
    // One pixel of context on each side, where the image has it.
    let pad_x = region.x.min(1);
    let pad_y = region.y.min(1);
    let padded_right = (region.x + region.width + 1).min(image_width);
    let padded_bottom = (region.y + region.height + 1).min(image_height);
    let padded = crop_imm(image, region.x - pad_x, region.y - pad_y,
                          padded_right - (region.x - pad_x),
                          padded_bottom - (region.y - pad_y)).to_image();
    let smoothed = box_filter(&padded, 1, 1);

    let mut profile = Vec::<f64>::with_capacity(region.height as usize);
    for y in pad_y..pad_y + region.height {
        let mut sum_sq = 0.0_f64;
        for x in pad_x..pad_x + region.width {
            let diff = padded.get_pixel(x, y).0[0] as f64 - smoothed.get_pixel(x, y).0[0] as f64;
            sum_sq += diff * diff;
        }
        profile.push((sum_sq / region.width as f64).sqrt());
    }
    debug!("Noise profile over {:?} in {:?}", region, noise_start.elapsed());
    profile
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use image::Luma;
    use imageproc::gray_image;
    use imageproc::noise::gaussian_noise;
    use super::*;

    #[test]
    fn test_noise_region() {
        let image = GrayImage::new(500, 500);
        let circle = DetectedCircle::new(250, 250, 200);
        assert_eq!(noise_region(&image, &circle, 1.0), Region::new(150, 150, 200, 200));
        assert_eq!(noise_region(&image, &circle, 0.5), Region::new(200, 200, 100, 100));
        let corner = DetectedCircle::new(10, 490, 40);
        assert_eq!(noise_region(&image, &corner, 1.0), Region::new(0, 470, 30, 30));
    }

    #[test]
    fn test_flat_region_has_no_noise() {
        let image = GrayImage::from_pixel(20, 20, Luma([77_u8]));
        let profile = noise_profile(&image, &Region::new(2, 3, 10, 6));
        assert_eq!(profile, vec![0.0; 6]);
    }

    #[test]
    fn test_empty_region() {
        let image = GrayImage::from_pixel(20, 20, Luma([77_u8]));
        assert!(noise_profile(&image, &Region::new(5, 5, 0, 4)).is_empty());
        let circle = DetectedCircle::new(10, 10, 0);
        assert!(noise_profile(&image, &noise_region(&image, &circle, 1.0)).is_empty());
    }

    #[test]
    fn test_single_outlier_row() {
        // Only the middle row of the 3x3 neighborhood around the outlier sees
        // a residual at the outlier itself.
        let image = gray_image!(
            10, 10, 10, 10, 10;
            10, 10, 10, 10, 10;
            10, 10, 100, 10, 10;
            10, 10, 10, 10, 10;
            10, 10, 10, 10, 10);
        let profile = noise_profile(&image, &Region::new(0, 0, 5, 5));
        assert_eq!(profile.len(), 5);
        assert_eq!(profile[0], 0.0);
        assert_eq!(profile[4], 0.0);
        // The outlier row has the largest residual.
        assert!(profile[2] > profile[1]);
        assert!(profile[2] > profile[3]);
        assert_abs_diff_eq!(profile[1], profile[3], epsilon = 1e-9);
    }

    #[test]
    fn test_smoothing_reads_pixels_outside_region() {
        // Bright row just above the region.
        let image = GrayImage::from_fn(20, 20, |_x, y| {
            if y == 4 { Luma([200_u8]) } else { Luma([100_u8]) }
        });
        let profile = noise_profile(&image, &Region::new(5, 5, 10, 10));
        assert_eq!(profile.len(), 10);
        // Top row is smoothed against (3 * 200 + 6 * 100) / 9.
        assert_abs_diff_eq!(profile[0], 100.0 / 3.0, epsilon = 1.0);
        assert_eq!(profile[1], 0.0);
        assert_eq!(profile[9], 0.0);
    }

    #[test]
    fn test_region_at_image_border() {
        let image = GrayImage::from_fn(10, 10, |x, _y| {
            if x == 9 { Luma([40_u8]) } else { Luma([100_u8]) }
        });
        // Region touching the image's top-left corner: no context is read
        // there, but the column right of the region is.
        let profile = noise_profile(&image, &Region::new(0, 0, 9, 3));
        assert_eq!(profile.len(), 3);
        assert!(profile.iter().all(|&n| n > 0.0));
        assert!(noise_profile(&image, &Region::new(0, 0, 8, 3)).iter().all(|&n| n == 0.0));
    }

    #[test]
    fn test_noisy_region() {
        let image = gaussian_noise(&GrayImage::from_pixel(60, 60, Luma([128_u8])),
                                   0.0, 8.0, 7);
        let profile = noise_profile(&image, &Region::new(10, 10, 40, 40));
        assert_eq!(profile.len(), 40);
        // Residual against a 3x3 mean of white noise is sqrt(8/9) of sigma.
        let mean: f64 = profile.iter().sum::<f64>() / profile.len() as f64;
        assert_abs_diff_eq!(mean, 8.0 * (8.0_f64 / 9.0).sqrt(), epsilon = 1.0);
    }
}  // mod tests.
