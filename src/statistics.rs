// Copyright (c) 2025 The edgescope developers
// See LICENSE file in root directory for license terms.

use image::GrayImage;
use log::debug;

use crate::histogram_funcs::{histogram_for_region, stats_for_histogram};
use crate::region::Region;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SignalStatistics {
    pub signal_mean: f64,
    pub noise_std: f64,
    /// Contrast-to-noise ratio, `signal_mean / noise_std`. Defined as 0 when
    /// `noise_std` is 0.
    pub cnr: f64,
}

impl SignalStatistics {
    pub fn from_moments(signal_mean: f64, noise_std: f64) -> SignalStatistics {
        let cnr = if noise_std > 0.0 { signal_mean / noise_std } else { 0.0 };
        SignalStatistics{signal_mean, noise_std, cnr}
    }

    /// Whether the CNR was forced to 0 by a zero standard deviation.
    pub fn division_guarded(&self) -> bool {
        !(self.noise_std > 0.0)
    }
}

/// Mean and standard deviation of the pixel values within `region`, and their
/// ratio. An empty region yields all zeros.
pub fn region_statistics(image: &GrayImage, region: &Region) -> SignalStatistics {
    let histogram = histogram_for_region(image, region);
    let stats = stats_for_histogram(&histogram);
    debug!("Statistics over {:?}: {} pixels, mean {}, stddev {}",
           region, stats.count, stats.mean, stats.stddev);
    SignalStatistics::from_moments(stats.mean, stats.stddev)
}

// mod tests.
