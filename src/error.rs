// Copyright (c) 2025 The edgescope developers
// See LICENSE file in root directory for license terms.

use thiserror::Error;

/// Conditions that stop an analysis request. None of these is fatal; the
/// `Display` text doubles as the status message shown to the user.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AnalysisError {
    #[error("No image loaded")]
    NoImage,

    #[error("No circles detected")]
    NotFound,
}

/// Conditions that an analysis works around rather than failing on. They are
/// recorded on the [crate::analysis::AnalysisResult] that was produced despite
/// them.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum Recovery {
    /// A region of interest had zero area after clamping to the image; the
    /// stage produced empty output.
    #[error("{stage} ROI is empty")]
    DegenerateRoi { stage: RoiStage },

    /// The noise standard deviation was zero; CNR was reported as 0.
    #[error("noise stddev is zero, CNR reported as 0")]
    DivisionGuard,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoiStage {
    Noise,
    Statistics,
}

impl std::fmt::Display for RoiStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoiStage::Noise => write!(f, "noise"),
            RoiStage::Statistics => write!(f, "statistics"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("parsing config {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
}
