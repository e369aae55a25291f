// Copyright (c) 2024 Steven Rosenthal smr@dt3.org
// Copyright (c) 2025 The edgescope developers
// See LICENSE file in root directory for license terms.

use image::GrayImage;

use crate::region::{EnumeratePixels, Region};

#[derive(Debug, PartialEq)]
pub struct HistogramStats {
    pub count: u64,
    pub mean: f64,
    pub stddev: f64,
}

/// Accumulates the 256-bin histogram of the pixel values within `region`.
pub fn histogram_for_region(image: &GrayImage, region: &Region) -> [u32; 256] {
    let mut histogram = [0_u32; 256];
    for (_x, _y, pixel_value) in EnumeratePixels::new(image, region) {
        histogram[pixel_value as usize] += 1;
    }
    histogram
}

/// Moments of the values summarized by `histogram`. The standard deviation is
/// the population value (normalized by the count, not count - 1). An empty
/// histogram yields all zeros.
pub fn stats_for_histogram(histogram: &[u32]) -> HistogramStats {
    let mut count: u64 = 0;
    let mut first_moment: u64 = 0;
    for (h, &bin_count) in histogram.iter().enumerate() {
        count += bin_count as u64;
        first_moment += bin_count as u64 * h as u64;
    }
    if count == 0 {
        return HistogramStats{count: 0, mean: 0.0, stddev: 0.0};
    }
    let mean = first_moment as f64 / count as f64;
    let mut second_moment: f64 = 0.0;
    for (h, &bin_count) in histogram.iter().enumerate() {
        second_moment += bin_count as f64 * (h as f64 - mean) * (h as f64 - mean);
    }
    let stddev = (second_moment / count as f64).sqrt();
    HistogramStats{count, mean, stddev}
}

// mod tests.
