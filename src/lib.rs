// Copyright (c) 2025 The edgescope developers
// See LICENSE file in root directory for license terms.

//! EdgeScope measures the edge sharpness and noise of a circular feature in a
//! grayscale image. Given an image containing a bright (or dark) disk, it
//! locates the disk and reports:
//!
//! * The edge profile: mean intensity as a function of radial offset from the
//!   disk's boundary, averaged over all directions.
//! * The response curve: the discrete derivative of the edge profile, whose
//!   peak height and width characterize edge sharpness.
//! * A noise profile: per-row RMS residual against a 3x3 smoothing, over a
//!   square region centered on the disk.
//! * Signal mean, noise standard deviation, and their ratio (the
//!   contrast-to-noise ratio, CNR) over a central region.
//!
//! # Usage
//!
//! The one-shot entry point is [analysis::analyze()], which runs circle
//! detection followed by the measurement stages and returns an
//! [analysis::AnalysisResult]. When the circle is already known,
//! [analysis::analyze_circle()] runs just the measurements.
//!
//! Interactive front ends use [session::AnalysisSession], which holds a
//! source/processed image pair, applies the filters in [image_funcs], and keeps
//! the most recent successful result available for display or export as JSON.
//!
//! # Detection
//!
//! Circles are found with a gradient Hough transform over a Canny edge map
//! (see [detector]). The first (strongest) circle is used; images without any
//! detectable circle yield [error::AnalysisError::NotFound].
//!
//! # Degenerate inputs
//!
//! Measurement never fails once a circle is known. A zero radius or a center
//! far outside the image produces empty profiles and zero statistics, and a
//! perfectly flat statistics region reports a CNR of 0. Each such condition is
//! recorded in [analysis::AnalysisResult::recoveries] and logged.

pub mod analysis;
pub mod config;
pub mod detector;
pub mod error;
pub mod histogram_funcs;
pub mod image_funcs;
pub mod noise;
pub mod profile;
pub mod region;
pub mod session;
pub mod statistics;
