//! OCR engine running every attempt and keeping the longest text.

use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info, warn};

use crate::models::config::{OcrConfig, PreprocessConfig};

use super::{
    attempts::{ImageVariant, OCR_ATTEMPTS},
    orientation::OrientationCorrector,
    preprocessing::ImagePreprocessor,
    AttemptOutcome, OcrBackend, OcrResult,
};

/// Multi-attempt OCR engine over a recognition backend.
pub struct OcrEngine<B: OcrBackend> {
    backend: B,
    preprocessor: ImagePreprocessor,
    orientation: OrientationCorrector,
}

/// Builder for OcrEngine.
pub struct OcrEngineBuilder<B: OcrBackend> {
    backend: B,
    preprocessor: ImagePreprocessor,
    orientation: OrientationCorrector,
}

impl<B: OcrBackend> OcrEngineBuilder<B> {
    /// Create a new builder with default configuration.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            preprocessor: ImagePreprocessor::new(),
            orientation: OrientationCorrector::default(),
        }
    }

    /// Set the image preprocessor.
    pub fn with_preprocessor(mut self, preprocessor: ImagePreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Set preprocessing from configuration.
    pub fn with_preprocess_config(self, config: &PreprocessConfig) -> Self {
        self.with_preprocessor(ImagePreprocessor::from_config(config))
    }

    /// Set the orientation corrector.
    pub fn with_orientation(mut self, orientation: OrientationCorrector) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set orientation handling from configuration.
    pub fn with_ocr_config(self, config: &OcrConfig) -> Self {
        let orientation = if config.detect_orientation {
            OrientationCorrector::new(config.min_orientation_confidence)
        } else {
            OrientationCorrector::disabled()
        };
        self.with_orientation(orientation)
    }

    /// Build the OCR engine.
    pub fn build(self) -> OcrEngine<B> {
        OcrEngine {
            backend: self.backend,
            preprocessor: self.preprocessor,
            orientation: self.orientation,
        }
    }
}

impl<B: OcrBackend> OcrEngine<B> {
    /// Create a new builder.
    pub fn builder(backend: B) -> OcrEngineBuilder<B> {
        OcrEngineBuilder::new(backend)
    }

    /// The recognition backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run every attempt on an image and keep the longest text.
    ///
    /// Never fails: attempts that error count as empty output.
    pub fn process(&self, image: &DynamicImage) -> OcrResult {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        info!("Processing image: {}x{}", width, height);

        let (upright, rotation) = self.orientation.correct(&self.backend, image.clone());
        let enhanced = self.preprocessor.enhance(&upright);
        let right_crop = self.preprocessor.right_crop(&enhanced);

        let mut attempts = Vec::with_capacity(OCR_ATTEMPTS.len());
        let mut best: Option<(&'static str, usize, String)> = None;

        for attempt in OCR_ATTEMPTS.iter() {
            let input = match attempt.variant {
                ImageVariant::Original => &upright,
                ImageVariant::Enhanced => &enhanced,
                ImageVariant::RightCrop => &right_crop,
            };

            let outcome = match self.backend.recognize(input, &attempt.config) {
                Ok(text) => {
                    let chars = text.trim().chars().count();
                    debug!("Attempt {} produced {} chars", attempt.name, chars);

                    // Strictly longer only, so ties keep the earlier attempt
                    if chars > best.as_ref().map(|(_, n, _)| *n).unwrap_or(0) {
                        best = Some((attempt.name, chars, text));
                    }
                    AttemptOutcome {
                        name: attempt.name,
                        chars,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!("Attempt {} failed: {}", attempt.name, e);
                    AttemptOutcome {
                        name: attempt.name,
                        chars: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            attempts.push(outcome);
        }

        let (best_attempt, text) = match best {
            Some((name, _, text)) => (Some(name), text),
            None => (None, String::new()),
        };

        let result = OcrResult {
            text,
            rotation,
            best_attempt,
            attempts,
            processing_time_ms: start.elapsed().as_millis() as u64,
            image_size: (width, height),
        };

        info!(
            "OCR complete: {} chars from {:?} in {}ms",
            result.text.trim().chars().count(),
            result.best_attempt,
            result.processing_time_ms
        );

        result
    }
}
