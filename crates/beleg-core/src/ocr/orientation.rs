//! Page orientation correction.

use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, warn};

use super::{OcrBackend, OrientationEstimate};

/// Clockwise rotation applied to bring a page upright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    /// Map a clockwise angle in degrees. Only right angles are accepted.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Self::None),
            90 => Some(Self::Clockwise90),
            180 => Some(Self::Clockwise180),
            270 => Some(Self::Clockwise270),
            _ => None,
        }
    }

    /// Rotate an image by this amount.
    pub fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            Self::None => image,
            Self::Clockwise90 => image.rotate90(),
            Self::Clockwise180 => image.rotate180(),
            Self::Clockwise270 => image.rotate270(),
        }
    }
}

/// Rotates pages upright when the engine is confident enough.
#[derive(Debug, Clone)]
pub struct OrientationCorrector {
    enabled: bool,
    min_confidence: f32,
}

impl OrientationCorrector {
    /// Create a new corrector with the given confidence threshold.
    pub fn new(min_confidence: f32) -> Self {
        Self {
            enabled: true,
            min_confidence,
        }
    }

    /// A corrector that never rotates.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            min_confidence: f32::INFINITY,
        }
    }

    /// Decide the rotation for an estimate.
    pub fn decide(&self, estimate: &OrientationEstimate) -> Rotation {
        if !self.enabled || estimate.confidence < self.min_confidence {
            return Rotation::None;
        }
        Rotation::from_degrees(estimate.rotate).unwrap_or_default()
    }

    /// Detect orientation and rotate if needed.
    ///
    /// Detection failures leave the image as it is.
    pub fn correct<B: OcrBackend + ?Sized>(
        &self,
        backend: &B,
        image: DynamicImage,
    ) -> (DynamicImage, Rotation) {
        if !self.enabled {
            return (image, Rotation::None);
        }

        let rotation = match backend.detect_orientation(&image) {
            Ok(estimate) => {
                let rotation = self.decide(&estimate);
                debug!(
                    "Orientation: rotate {}° (confidence {:.2}) -> {:?}",
                    estimate.rotate, estimate.confidence, rotation
                );
                rotation
            }
            Err(e) => {
                warn!("Orientation detection failed, keeping image as is: {}", e);
                Rotation::None
            }
        };

        (rotation.apply(image), rotation)
    }
}

impl Default for OrientationCorrector {
    fn default() -> Self {
        Self::new(2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRecognizer;
    use image::{GenericImageView, RgbImage};

    fn estimate(rotate: u32, confidence: f32) -> OrientationEstimate {
        OrientationEstimate { rotate, confidence }
    }

    #[test]
    fn test_from_degrees() {
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::Clockwise90));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Clockwise90));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn test_decide_respects_threshold() {
        let corrector = OrientationCorrector::new(2.0);
        assert_eq!(corrector.decide(&estimate(180, 5.1)), Rotation::Clockwise180);
        assert_eq!(corrector.decide(&estimate(180, 0.4)), Rotation::None);
        assert_eq!(corrector.decide(&estimate(33, 9.0)), Rotation::None);
        assert_eq!(OrientationCorrector::disabled().decide(&estimate(90, 9.0)), Rotation::None);
    }

    #[test]
    fn test_correct_rotates_quarter_turn() {
        let backend = ScriptedRecognizer::new("").with_orientation(90, 6.0);
        let image = DynamicImage::ImageRgb8(RgbImage::new(40, 10));

        let (rotated, rotation) = OrientationCorrector::default().correct(&backend, image);
        assert_eq!(rotation, Rotation::Clockwise90);
        assert_eq!(rotated.dimensions(), (10, 40));
    }

    #[test]
    fn test_correct_swallows_failures() {
        let backend = ScriptedRecognizer::new("").with_orientation_error("no osd data");
        let image = DynamicImage::ImageRgb8(RgbImage::new(40, 10));

        let (same, rotation) = OrientationCorrector::default().correct(&backend, image);
        assert_eq!(rotation, Rotation::None);
        assert_eq!(same.dimensions(), (40, 10));
    }
}
