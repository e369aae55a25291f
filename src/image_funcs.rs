// Copyright (c) 2025 The edgescope developers
// See LICENSE file in root directory for license terms.

use std::fmt;
use std::str::FromStr;

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_filled_circle_mut, draw_hollow_circle_mut};
use imageproc::filter::{gaussian_blur_f32, laplacian_filter, sharpen3x3};
use imageproc::noise::gaussian_noise;

use crate::config::AnalysisConfig;
use crate::detector::DetectedCircle;

/// Sigma of the smoothing applied to synthesized test images.
const SYNTHETIC_BLUR_SIGMA: f32 = 2.0;

/// A white filled circle of the given `radius` centered on a black
/// `width` x `height` canvas, Gaussian smoothed so that its boundary is a soft
/// edge rather than a hard step.
pub fn synthesize_test_image(width: u32, height: u32, radius: u32) -> GrayImage {
    let mut image = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return image;
    }
    draw_filled_circle_mut(&mut image, ((width / 2) as i32, (height / 2) as i32),
                           radius as i32, Luma([255_u8]));
    gaussian_blur_f32(&image, SYNTHETIC_BLUR_SIGMA)
}

/// The image filters offered alongside the analysis.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FilterKind {
    Sharpen,
    GaussBlur,
    Noise,
    EdgeEnhance,
}

impl FilterKind {
    pub const ALL: [FilterKind; 4] = [FilterKind::Sharpen, FilterKind::GaussBlur,
                                      FilterKind::Noise, FilterKind::EdgeEnhance];

    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Sharpen => "Sharpen filter",
            FilterKind::GaussBlur => "Gauss Blur",
            FilterKind::Noise => "Noise Addition",
            FilterKind::EdgeEnhance => "Edge Enhancement",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sharpen" => Ok(FilterKind::Sharpen),
            "blur" | "gauss-blur" => Ok(FilterKind::GaussBlur),
            "noise" => Ok(FilterKind::Noise),
            "edge-enhance" | "edge" => Ok(FilterKind::EdgeEnhance),
            _ => Err(format!("Unknown filter '{}'; expected one of sharpen, blur, \
                              noise, edge-enhance", s)),
        }
    }
}

/// Returns a filtered copy of `image`. Blur and noise parameters come from
/// `config`; the noise filter is seeded and so reproducible.
pub fn apply_filter(kind: FilterKind, image: &GrayImage, config: &AnalysisConfig)
                    -> GrayImage {
    match kind {
        FilterKind::Sharpen => sharpen3x3(image),
        FilterKind::GaussBlur => {
            if config.blur_sigma > 0.0 {
                gaussian_blur_f32(image, config.blur_sigma)
            } else {
                image.clone()
            }
        },
        FilterKind::Noise =>
            gaussian_noise(image, 0.0, config.noise_stddev, config.noise_seed),
        FilterKind::EdgeEnhance => enhance_edges(image),
    }
}

// Adds the (non-negative part of the) Laplacian response to the image,
// saturating at 255.
fn enhance_edges(image: &GrayImage) -> GrayImage {
    let laplacian = laplacian_filter(image);
    let mut enhanced = image.clone();
    for (pixel, response) in enhanced.pixels_mut().zip(laplacian.pixels()) {
        let boost = response.0[0].clamp(0, 255) as u8;
        pixel.0[0] = pixel.0[0].saturating_add(boost);
    }
    enhanced
}

/// Draws `circle` and a cross at its center onto a color copy of `image`.
pub fn annotate_circle(image: &GrayImage, circle: &DetectedCircle) -> RgbImage {
    let mut annotated = DynamicImage::ImageLuma8(image.clone()).into_rgb8();
    let color = Rgb::<u8>([255, 0, 0]);
    let center = (circle.center.x, circle.center.y);
    draw_hollow_circle_mut(&mut annotated, center, circle.radius as i32, color);
    draw_cross_mut(&mut annotated, color, circle.center.x, circle.center.y);
    annotated
}

/// Two image slots: the source that analyses and filters read from, and a
/// processed slot that receives filter output. [ImagePair::swap()] exchanges
/// the roles of the two slots without moving any pixels.
#[derive(Clone, Debug, Default)]
pub struct ImagePair {
    slots: [Option<GrayImage>; 2],
    active: usize,
}

impl ImagePair {
    pub fn source(&self) -> Option<&GrayImage> {
        self.slots[self.active].as_ref()
    }

    pub fn processed(&self) -> Option<&GrayImage> {
        self.slots[1 - self.active].as_ref()
    }

    pub fn set_source(&mut self, image: GrayImage) {
        self.slots[self.active] = Some(image);
    }

    pub fn set_processed(&mut self, image: GrayImage) {
        self.slots[1 - self.active] = Some(image);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    pub fn swap(&mut self) {
        self.active = 1 - self.active;
    }
}

// mod tests.
