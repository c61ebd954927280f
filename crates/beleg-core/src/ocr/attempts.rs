//! The ordered set of OCR attempts.

use serde::Serialize;

use super::RecognitionConfig;

/// Which rendition of the upright image an attempt reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageVariant {
    /// The image as received, after orientation correction.
    Original,
    /// Grayscale, contrast-stretched, upscaled, sharpened and binarized.
    Enhanced,
    /// Right-hand strip of the enhanced image, where prices line up.
    RightCrop,
}

/// One preprocessing variant paired with one engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OcrAttempt {
    pub name: &'static str,
    pub variant: ImageVariant,
    pub config: RecognitionConfig,
}

/// Attempts in priority order. All of them run; on equal scores the earlier
/// attempt is kept.
pub const OCR_ATTEMPTS: [OcrAttempt; 5] = [
    OcrAttempt {
        name: "original_block",
        variant: ImageVariant::Original,
        config: RecognitionConfig::BLOCK,
    },
    OcrAttempt {
        name: "enhanced_block",
        variant: ImageVariant::Enhanced,
        config: RecognitionConfig::BLOCK,
    },
    OcrAttempt {
        name: "enhanced_column",
        variant: ImageVariant::Enhanced,
        config: RecognitionConfig::SINGLE_COLUMN,
    },
    OcrAttempt {
        name: "price_column_block",
        variant: ImageVariant::RightCrop,
        config: RecognitionConfig::NUMERIC_BLOCK,
    },
    OcrAttempt {
        name: "price_column_line",
        variant: ImageVariant::RightCrop,
        config: RecognitionConfig::NUMERIC_LINE,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_attempt_names_are_unique() {
        let names: HashSet<_> = OCR_ATTEMPTS.iter().map(|a| a.name).collect();
        assert_eq!(names.len(), OCR_ATTEMPTS.len());
    }

    #[test]
    fn test_first_attempt_reads_original() {
        assert_eq!(OCR_ATTEMPTS[0].variant, ImageVariant::Original);
        assert_eq!(OCR_ATTEMPTS[0].config, RecognitionConfig::BLOCK);
    }

    #[test]
    fn test_crop_attempts_use_whitelist() {
        for attempt in OCR_ATTEMPTS.iter().filter(|a| a.variant == ImageVariant::RightCrop) {
            assert!(attempt.config.char_whitelist.is_some(), "{}", attempt.name);
        }
    }
}
