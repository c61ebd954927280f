//! OCR stage: recognition backends, preprocessing, orientation and the
//! multi-attempt engine.

mod attempts;
mod engine;
mod orientation;
mod preprocessing;
#[cfg(feature = "native")]
mod tesseract;

pub use attempts::{ImageVariant, OcrAttempt, OCR_ATTEMPTS};
pub use engine::{OcrEngine, OcrEngineBuilder};
pub use orientation::{OrientationCorrector, Rotation};
pub use preprocessing::{encode_png, ImagePreprocessor};
#[cfg(feature = "native")]
pub use tesseract::TesseractCli;

use image::DynamicImage;
use serde::Serialize;

use crate::error::OcrError;

/// A text recognizer mapping an image and a configuration to text.
///
/// Implementations wrap an external engine. They hold no per-document state
/// and may be called from several threads at once.
pub trait OcrBackend: Send + Sync {
    /// Recognize the text in an image.
    fn recognize(&self, image: &DynamicImage, config: &RecognitionConfig) -> Result<String, OcrError>;

    /// Estimate how the page must be rotated to be upright.
    fn detect_orientation(&self, image: &DynamicImage) -> Result<OrientationEstimate, OcrError>;

    /// Check that the engine can run, returning its version string.
    fn probe(&self) -> Result<String, OcrError>;
}

/// Tesseract page segmentation modes used by the attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageSegMode {
    /// Single column of text of variable sizes.
    SingleColumn,
    /// Uniform block of text.
    SingleBlock,
    /// Single text line.
    SingleLine,
}

impl PageSegMode {
    /// Numeric value passed as `--psm`.
    pub fn as_psm(self) -> u8 {
        match self {
            Self::SingleColumn => 4,
            Self::SingleBlock => 6,
            Self::SingleLine => 7,
        }
    }
}

/// Characters kept when reading price columns.
pub const PRICE_WHITELIST: &str = "0123456789.,'-CHFEUR€";

/// Engine settings for one recognition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecognitionConfig {
    pub page_seg_mode: PageSegMode,
    pub char_whitelist: Option<&'static str>,
    pub preserve_interword_spaces: bool,
}

impl RecognitionConfig {
    /// Uniform text block with inter-word spacing preserved.
    pub const BLOCK: Self = Self {
        page_seg_mode: PageSegMode::SingleBlock,
        char_whitelist: None,
        preserve_interword_spaces: true,
    };

    /// Single column of variably sized text.
    pub const SINGLE_COLUMN: Self = Self {
        page_seg_mode: PageSegMode::SingleColumn,
        char_whitelist: None,
        preserve_interword_spaces: false,
    };

    /// Uniform block restricted to price characters.
    pub const NUMERIC_BLOCK: Self = Self {
        page_seg_mode: PageSegMode::SingleBlock,
        char_whitelist: Some(PRICE_WHITELIST),
        preserve_interword_spaces: true,
    };

    /// Single line restricted to price characters.
    pub const NUMERIC_LINE: Self = Self {
        page_seg_mode: PageSegMode::SingleLine,
        char_whitelist: Some(PRICE_WHITELIST),
        preserve_interword_spaces: false,
    };
}

/// Page orientation reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrientationEstimate {
    /// Clockwise rotation in degrees that makes the page upright.
    pub rotate: u32,
    /// Engine confidence in the estimate.
    pub confidence: f32,
}

/// Outcome of one OCR attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptOutcome {
    /// Attempt name.
    pub name: &'static str,
    /// Characters in the trimmed output.
    pub chars: usize,
    /// Engine error, if the attempt failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Serialize)]
pub struct OcrResult {
    /// Text of the best attempt.
    pub text: String,

    /// Rotation applied before recognition.
    pub rotation: Rotation,

    /// Name of the attempt whose text was kept.
    pub best_attempt: Option<&'static str>,

    /// Every attempt in the order it ran.
    pub attempts: Vec<AttemptOutcome>,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height) before rotation.
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Number of attempts the engine reported as failed.
    pub fn failed_attempts(&self) -> usize {
        self.attempts.iter().filter(|a| a.error.is_some()).count()
    }

    /// Whether every attempt failed.
    pub fn all_failed(&self) -> bool {
        !self.attempts.is_empty() && self.failed_attempts() == self.attempts.len()
    }
}
