// Copyright (c) 2025 The edgescope developers
// See LICENSE file in root directory for license terms.

use image::GrayImage;
use log::{info, warn};

use crate::analysis::{analyze_circle, AnalysisRecord, AnalysisResult};
use crate::config::AnalysisConfig;
use crate::detector::{detect, DetectedCircle};
use crate::error::AnalysisError;
use crate::image_funcs::{apply_filter, synthesize_test_image, FilterKind, ImagePair};

/// Where the most recent analysis request left the session.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SessionState {
    Idle,
    ImageLoaded,
    /// Detection succeeded; [AnalysisSession::measure()] publishes the result.
    CircleDetected,
    AnalysisComplete,
    DetectionFailed,
}

/// Which slot receives a filter's output.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FilterTarget {
    /// Replace the source image.
    Source,
    /// Keep the source and write into the processed slot.
    Processed,
}

/// Owns the images and the current analysis result of one interactive
/// session. Every operation records a status message for display.
///
/// The current result is replaced only by a complete, successful analysis;
/// a failed request leaves it untouched. Mutation requires `&mut self`, so a
/// session shared between threads must be wrapped (e.g. in a `Mutex`), which
/// serializes analyses and keeps last-writer-wins semantics.
#[derive(Debug)]
pub struct AnalysisSession {
    config: AnalysisConfig,
    images: ImagePair,
    // Detected in the current source image and not yet measured.
    circle: Option<DetectedCircle>,
    result: Option<AnalysisResult>,
    state: SessionState,
    status: String,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        AnalysisSession::new(AnalysisConfig::default())
    }
}

impl AnalysisSession {
    pub fn new(config: AnalysisConfig) -> AnalysisSession {
        AnalysisSession{config,
                        images: ImagePair::default(),
                        circle: None,
                        result: None,
                        state: SessionState::Idle,
                        status: String::new()}
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn status_message(&self) -> &str {
        &self.status
    }

    pub fn images(&self) -> &ImagePair {
        &self.images
    }

    /// The result of the most recent successful analysis, if any.
    pub fn current_result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Flat export of the current result; `None` until an analysis succeeds.
    pub fn export(&self) -> Option<AnalysisRecord> {
        self.result.as_ref().map(AnalysisResult::to_record)
    }

    /// Response curve of the current result; empty when there is none.
    pub fn response_curve(&self) -> Vec<f64> {
        self.result.as_ref().map(AnalysisResult::response_curve).unwrap_or_default()
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        info!("{}", self.status);
    }

    /// The circle found by [AnalysisSession::detect()] awaiting measurement.
    pub fn detected_circle(&self) -> Option<&DetectedCircle> {
        self.circle.as_ref()
    }

    // The source image changed; any pending detection no longer applies.
    fn source_changed(&mut self) {
        self.circle = None;
        self.state = if self.images.source().is_some() {
            SessionState::ImageLoaded
        } else {
            SessionState::Idle
        };
    }

    pub fn load_image(&mut self, image: GrayImage) {
        self.images.set_source(image);
        self.source_changed();
        self.set_status("Image loaded successfully");
    }

    pub fn synthesize(&mut self, width: u32, height: u32, radius: u32) {
        self.images.set_source(synthesize_test_image(width, height, radius));
        self.source_changed();
        self.set_status("Test image synthesized");
    }

    /// Detects and measures the circle in the source image. On success the
    /// new result replaces the current one. On failure the current result is
    /// kept and the error's text becomes the status message.
    pub fn analyze(&mut self) -> Result<&AnalysisResult, AnalysisError> {
        self.detect()?;
        self.measure()
    }

    /// Locates the circle in the source image without publishing anything.
    /// The session moves to [SessionState::CircleDetected] on success and to
    /// [SessionState::DetectionFailed] otherwise.
    pub fn detect(&mut self) -> Result<DetectedCircle, AnalysisError> {
        self.circle = None;
        let Some(image) = self.images.source() else {
            self.set_status(AnalysisError::NoImage.to_string());
            return Err(AnalysisError::NoImage);
        };
        match detect(image, &self.config.detector) {
            Ok(circle) => {
                self.circle = Some(circle);
                self.state = SessionState::CircleDetected;
                self.set_status(format!("Circle detected at ({}, {}) radius {}",
                                        circle.center.x, circle.center.y, circle.radius));
                Ok(circle)
            },
            Err(e) => {
                warn!("Detection failed: {}", e);
                self.state = SessionState::DetectionFailed;
                self.set_status(e.to_string());
                Err(e)
            },
        }
    }

    /// Measures the circle found by the preceding [AnalysisSession::detect()]
    /// and publishes the result. Without a pending detection this fails with
    /// [AnalysisError::NotFound] and leaves the current result unchanged.
    pub fn measure(&mut self) -> Result<&AnalysisResult, AnalysisError> {
        let Some(circle) = self.circle else {
            self.set_status(AnalysisError::NotFound.to_string());
            return Err(AnalysisError::NotFound);
        };
        let Some(image) = self.images.source() else {
            self.set_status(AnalysisError::NoImage.to_string());
            return Err(AnalysisError::NoImage);
        };
        let result = analyze_circle(image, &circle, &self.config);
        let status = if result.recoveries.is_empty() {
            String::from("Analysis complete")
        } else {
            let notes: Vec<String> =
                result.recoveries.iter().map(|r| r.to_string()).collect();
            format!("Analysis complete ({})", notes.join("; "))
        };
        self.circle = None;
        self.state = SessionState::AnalysisComplete;
        self.set_status(status);
        Ok(&*self.result.insert(result))
    }

    pub fn apply_filter(&mut self, kind: FilterKind, target: FilterTarget)
                        -> Result<(), AnalysisError> {
        let Some(image) = self.images.source() else {
            self.set_status("No image");
            return Err(AnalysisError::NoImage);
        };
        let filtered = apply_filter(kind, image, &self.config);
        match target {
            FilterTarget::Source => {
                self.images.set_source(filtered);
                self.source_changed();
            },
            FilterTarget::Processed => self.images.set_processed(filtered),
        }
        self.set_status(format!("Applied {}", kind));
        Ok(())
    }

    pub fn swap_images(&mut self) -> Result<(), AnalysisError> {
        if self.images.is_empty() {
            self.set_status("No images available to swap");
            return Err(AnalysisError::NoImage);
        }
        self.images.swap();
        self.source_changed();
        self.set_status("Swapped images");
        Ok(())
    }
}

// mod tests.
