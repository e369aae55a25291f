// Copyright (c) 2025 The edgescope developers
// See LICENSE file in root directory for license terms.

use std::time::Instant;

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use imageproc::point::Point;
use log::{debug, info};

use crate::config::DetectorConfig;
use crate::error::AnalysisError;

/// A circular boundary located in an image. Coordinates are integer pixel
/// positions; the center may lie outside the image and the radius may be zero
/// when a circle is supplied by the caller rather than detected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DetectedCircle {
    pub center: Point<i32>,
    pub radius: u32,
}

impl DetectedCircle {
    pub fn new(x: i32, y: i32, radius: u32) -> DetectedCircle {
        DetectedCircle{center: Point::new(x, y), radius}
    }
}

// An edge pixel together with its unit gradient direction.
#[derive(Copy, Clone, Debug)]
struct EdgePoint {
    x: f32,
    y: f32,
    dir_x: f32,
    dir_y: f32,
}

// Runs Canny on `image` and keeps the edge pixels whose Sobel gradient (taken
// on `image` itself, since the binary edge map carries no direction) is at
// least `gradient_threshold`.
fn collect_edge_points(image: &GrayImage, config: &DetectorConfig) -> Vec<EdgePoint> {
    let edges = canny(image, config.canny_low, config.canny_high);
    let grad_x = horizontal_sobel(image);
    let grad_y = vertical_sobel(image);
    let mut points = Vec::<EdgePoint>::new();
    for (x, y, pixel) in edges.enumerate_pixels() {
        if pixel.0[0] == 0 {
            continue;
        }
        let gx = grad_x.get_pixel(x, y).0[0] as f32;
        let gy = grad_y.get_pixel(x, y).0[0] as f32;
        let magnitude = gx.hypot(gy);
        if magnitude == 0.0 || magnitude < config.gradient_threshold {
            continue;
        }
        points.push(EdgePoint{x: x as f32, y: y as f32,
                              dir_x: gx / magnitude, dir_y: gy / magnitude});
    }
    points
}

// Hough accumulator over candidate circle centers. Each cell covers
// `resolution` x `resolution` image pixels.
struct Accumulator {
    width: u32,
    height: u32,
    resolution: u32,
    votes: Vec<u32>,
}

impl Accumulator {
    fn new(image_width: u32, image_height: u32, resolution: u32) -> Accumulator {
        let resolution = resolution.max(1);
        let width = image_width.div_ceil(resolution);
        let height = image_height.div_ceil(resolution);
        Accumulator{width, height, resolution,
                    votes: vec![0; (width * height) as usize]}
    }

    fn cell(&self, x: f32, y: f32) -> Option<usize> {
        let res = self.resolution as f32;
        let cx = ((x + 0.5) / res).floor();
        let cy = ((y + 0.5) / res).floor();
        if cx < 0.0 || cy < 0.0 || cx >= self.width as f32 || cy >= self.height as f32 {
            return None;
        }
        Some(cy as usize * self.width as usize + cx as usize)
    }

    fn get(&self, cx: i64, cy: i64) -> u32 {
        if cx < 0 || cy < 0 || cx >= self.width as i64 || cy >= self.height as i64 {
            return 0;
        }
        self.votes[(cy * self.width as i64 + cx) as usize]
    }

    // Image-space position of a cell's center.
    fn to_image(&self, cx: f32, cy: f32) -> (f32, f32) {
        let offset = (self.resolution - 1) as f32 / 2.0;
        (cx * self.resolution as f32 + offset, cy * self.resolution as f32 + offset)
    }
}

#[derive(Copy, Clone, Debug)]
struct CenterCandidate {
    x: f32,
    y: f32,
    votes: u32,
}

// Each edge point votes for every cell along its gradient line, in both
// directions, at distances between `min_radius` and `max_radius`.
fn cast_votes(acc: &mut Accumulator, points: &[EdgePoint],
              min_radius: u32, max_radius: u32) {
    for point in points {
        for sign in [1.0_f32, -1.0_f32] {
            for r in min_radius..=max_radius {
                let x = point.x + sign * point.dir_x * r as f32;
                let y = point.y + sign * point.dir_y * r as f32;
                match acc.cell(x, y) {
                    Some(index) => acc.votes[index] += 1,
                    None => break,  // Left the accumulator; stays outside.
                }
            }
        }
    }
}

// Returns accumulator local maxima having at least `threshold` votes, ordered
// by decreasing vote count (raster order among ties). Positions are refined to
// the vote-weighted centroid of the 3x3 neighborhood and expressed in image
// coordinates.
fn find_center_candidates(acc: &Accumulator, threshold: u32) -> Vec<CenterCandidate> {
    let mut candidates = Vec::<CenterCandidate>::new();
    for cy in 0..acc.height as i64 {
        for cx in 0..acc.width as i64 {
            let votes = acc.get(cx, cy);
            if votes == 0 || votes < threshold {
                continue;
            }
            // Strict on one side, non-strict on the other so that a plateau
            // yields exactly one maximum.
            if votes <= acc.get(cx - 1, cy) || votes < acc.get(cx + 1, cy) ||
                votes <= acc.get(cx, cy - 1) || votes < acc.get(cx, cy + 1) {
                continue;
            }
            let mut m0 = 0.0_f32;
            let mut m1x = 0.0_f32;
            let mut m1y = 0.0_f32;
            for ny in cy - 1..=cy + 1 {
                for nx in cx - 1..=cx + 1 {
                    let v = acc.get(nx, ny) as f32;
                    m0 += v;
                    m1x += nx as f32 * v;
                    m1y += ny as f32 * v;
                }
            }
            let (x, y) = acc.to_image(m1x / m0, m1y / m0);
            candidates.push(CenterCandidate{x, y, votes});
        }
    }
    candidates.sort_by(|a, b| b.votes.cmp(&a.votes));
    candidates
}

// Histograms the distances from `center` to the edge points in one pixel bins
// and picks the bin with the most support (summed with its two neighbors so
// that a ring straddling two bins is not split). Returns the mean distance of
// the supporting points, or None if the support is below `threshold`.
fn estimate_radius(center: (f32, f32), points: &[EdgePoint],
                   min_radius: u32, max_radius: u32, threshold: u32)
                   -> Option<(f32, u32)> {
    let mut bins = vec![0_u32; max_radius as usize + 2];
    let mut distances = Vec::<f32>::with_capacity(points.len());
    for point in points {
        let d = (point.x - center.0).hypot(point.y - center.1);
        if d < min_radius as f32 - 0.5 || d > max_radius as f32 + 0.5 {
            continue;
        }
        bins[d.round() as usize] += 1;
        distances.push(d);
    }
    let mut best_bin = 0_usize;
    let mut best_support = 0_u32;
    for bin in (min_radius.max(1) as usize)..=(max_radius as usize) {
        let support = bins[bin - 1] + bins[bin] + bins[bin + 1];
        if support > best_support ||
            (support == best_support && bins[bin] > bins[best_bin]) {
            best_support = support;
            best_bin = bin;
        }
    }
    if best_support == 0 || best_support < threshold {
        return None;
    }
    let mut sum = 0.0_f32;
    let mut count = 0;
    for d in distances {
        if (d.round() as i64 - best_bin as i64).abs() <= 1 {
            sum += d;
            count += 1;
        }
    }
    let radius = (sum / count as f32).clamp(min_radius as f32, max_radius as f32);
    Some((radius, best_support))
}

/// Locates circular boundaries in `image` using a gradient Hough transform:
///
/// 1. A Canny edge map is computed with the configured thresholds.
/// 2. Every edge pixel votes for candidate centers along its gradient line.
/// 3. Accumulator local maxima with enough votes become center candidates,
///    strongest first. Candidates closer than `min_center_distance` to an
///    already accepted circle are dropped.
/// 4. For each center, the radius is the edge pixel distance with the most
///    support.
///
/// # Arguments
///   `image` - The image to search.
///
///   `config` - Detector parameters. A `max_radius` of 0 searches up to the
///   image diagonal.
///
///   `max_circles` - Stop once this many circles are accepted.
///
/// # Returns
/// The accepted circles, strongest center first, with center and radius
/// rounded to the nearest pixel.
pub fn find_circles(image: &GrayImage, config: &DetectorConfig, max_circles: usize)
                    -> Vec<DetectedCircle> {
    let find_start = Instant::now();
    let (width, height) = image.dimensions();
    let mut circles = Vec::<DetectedCircle>::new();
    if width == 0 || height == 0 || max_circles == 0 {
        return circles;
    }
    let min_radius = config.min_radius.max(1);
    // No circle with its center in the image can exceed the diagonal.
    let diagonal = (width as f64).hypot(height as f64).ceil() as u32;
    let max_radius = if config.max_radius == 0 {
        diagonal
    } else {
        config.max_radius.min(diagonal)
    };
    if min_radius > max_radius {
        debug!("Empty radius range {}..={}", min_radius, max_radius);
        return circles;
    }

    let points = collect_edge_points(image, config);
    debug!("{} edge points in {:?}", points.len(), find_start.elapsed());
    if points.is_empty() {
        info!("No edges found in {}x{} image", width, height);
        return circles;
    }
    let mut acc = Accumulator::new(width, height, config.resolution);
    cast_votes(&mut acc, &points, min_radius, max_radius);
    let candidates = find_center_candidates(&acc, config.accumulator_threshold);
    debug!("{} center candidates", candidates.len());

    let mut accepted = Vec::<(f32, f32)>::new();
    for candidate in candidates {
        let too_close = accepted.iter().any(|&(x, y)| {
            (candidate.x - x).hypot(candidate.y - y) < config.min_center_distance
        });
        if too_close {
            continue;
        }
        let Some((radius, support)) = estimate_radius(
            (candidate.x, candidate.y), &points, min_radius, max_radius,
            config.accumulator_threshold) else {
            continue;
        };
        debug!("Circle at ({}, {}) radius {}; {} votes, {} edge points",
               candidate.x, candidate.y, radius, candidate.votes, support);
        accepted.push((candidate.x, candidate.y));
        circles.push(DetectedCircle::new(candidate.x.round() as i32,
                                         candidate.y.round() as i32,
                                         radius.round() as u32));
        if circles.len() >= max_circles {
            break;
        }
    }
    info!("Hough search found {} circles in {:?}", circles.len(), find_start.elapsed());
    circles
}

/// Returns the first circle found by [find_circles()]. Candidates are not
/// re-ranked: the strongest center whose radius can be established wins.
pub fn detect(image: &GrayImage, config: &DetectorConfig)
              -> Result<DetectedCircle, AnalysisError> {
    find_circles(image, config, 1).into_iter().next().ok_or(AnalysisError::NotFound)
}

// mod tests.
