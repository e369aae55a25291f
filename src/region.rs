// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// Copyright (c) 2025 The edgescope developers
// See LICENSE file in root directory for license terms.

use image::GrayImage;
use imageproc::point::Point;

/// Axis-aligned rectangle in image pixel coordinates. Unlike
/// [imageproc::rect::Rect], a `Region` may be empty; this is what a region
/// of interest degenerates to once it is clamped against the image bounds.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Region {
        Region{x, y, width, height}
    }

    /// Returns the square of the given `side` length centered on `center`,
    /// clamped to a `width` x `height` image. The origin is clamped to be
    /// non-negative and the extent is shrunk so the region never reaches past
    /// the image's right or bottom edge.
    pub fn centered_square(center: Point<i32>, side: u32,
                           width: u32, height: u32) -> Region {
        let half = (side / 2) as i64;
        let (x0, x1) = clamp_span(center.x as i64 - half, side, width);
        let (y0, y1) = clamp_span(center.y as i64 - half, side, height);
        Region{x: x0, y: y0, width: x1 - x0, height: y1 - y0}
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether this region lies entirely within a `width` x `height` image.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64 &&
            self.y as u64 + self.height as u64 <= height as u64
    }
}

// Clamps the half-open span [start, start+len) to [0, limit).
fn clamp_span(start: i64, len: u32, limit: u32) -> (u32, u32) {
    let limit = limit as i64;
    let lo = start.clamp(0, limit);
    let hi = (start + len as i64).clamp(lo, limit);
    (lo as u32, hi as u32)
}

/// An iterator over the pixels of a region of interest. Yields
/// (x, y, pixel value) in raster scan order.
pub struct EnumeratePixels<'a> {
    image: &'a GrayImage,
    region: Region,

    // Identifies the next pixel to be yielded. If cur_y is past the region's
    // bottom, the iteration is finished.
    cur_x: u32,
    cur_y: u32,
}

impl<'a> EnumeratePixels<'a> {
    /// # Panics
    /// The `region` must lie within `image`.
    pub fn new(image: &'a GrayImage, region: &Region) -> EnumeratePixels<'a> {
        let (width, height) = image.dimensions();
        assert!(region.fits(width, height),
                "Region {:?} exceeds image {}x{}", region, width, height);
        let cur_y = if region.is_empty() { region.y + region.height.max(1) }
                    else { region.y };
        EnumeratePixels{image, region: *region, cur_x: region.x, cur_y}
    }
}

impl<'a> Iterator for EnumeratePixels<'a> {
    type Item = (u32, u32, u8);  // x, y, pixel value.

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur_y >= self.region.y + self.region.height {
            return None;
        }
        let item: Self::Item = (self.cur_x, self.cur_y,
                                self.image.get_pixel(self.cur_x, self.cur_y).0[0]);
        if self.cur_x + 1 == self.region.x + self.region.width {
            self.cur_x = self.region.x;
            self.cur_y += 1;
        } else {
            self.cur_x += 1;
        }
        Some(item)
    }
}

// mod tests.
