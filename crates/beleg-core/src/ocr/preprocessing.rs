//! Image preprocessing for OCR.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use tracing::debug;

use crate::error::OcrError;
use crate::models::config::PreprocessConfig;

/// 3x3 sharpening kernel, weights summing to one.
#[rustfmt::skip]
const SHARPEN_KERNEL: [f32; 9] = [
    -2.0 / 16.0, -2.0 / 16.0, -2.0 / 16.0,
    -2.0 / 16.0, 32.0 / 16.0, -2.0 / 16.0,
    -2.0 / 16.0, -2.0 / 16.0, -2.0 / 16.0,
];

const MIN_CROP_FRACTION: f32 = 0.05;
const MAX_CROP_FRACTION: f32 = 0.90;

/// Builds the image variants the OCR attempts read.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Longer side an image is upscaled to when it is smaller.
    upscale_target: u32,
    /// Luminance above which a pixel becomes white.
    binarize_threshold: u8,
    /// Fraction of the width kept by the right-hand crop.
    right_crop_fraction: f32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self::from_config(&PreprocessConfig::default())
    }

    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self {
            upscale_target: config.upscale_target,
            binarize_threshold: config.binarize_threshold,
            right_crop_fraction: config.right_crop_fraction,
        }
    }

    /// Set the upscale target for the longer side.
    pub fn with_upscale_target(mut self, target: u32) -> Self {
        self.upscale_target = target;
        self
    }

    /// Set the binarization threshold.
    pub fn with_binarize_threshold(mut self, threshold: u8) -> Self {
        self.binarize_threshold = threshold;
        self
    }

    /// Set the right-hand crop fraction. Values are clamped to [0.05, 0.90].
    pub fn with_right_crop_fraction(mut self, fraction: f32) -> Self {
        self.right_crop_fraction = fraction;
        self
    }

    /// Grayscale, stretch contrast, upscale small images, sharpen and binarize.
    pub fn enhance(&self, image: &DynamicImage) -> DynamicImage {
        let gray = autocontrast(image.to_luma8());

        let (width, height) = gray.dimensions();
        let (new_width, new_height) =
            calculate_upscale_dimensions(width, height, self.upscale_target);
        let scaled = if (new_width, new_height) != (width, height) {
            debug!(
                "Upscaling {}x{} to {}x{} for OCR",
                width, height, new_width, new_height
            );
            imageops::resize(&gray, new_width, new_height, FilterType::Lanczos3)
        } else {
            gray
        };

        let sharpened: GrayImage = imageops::filter3x3(&scaled, &SHARPEN_KERNEL);
        DynamicImage::ImageLuma8(binarize(&sharpened, self.binarize_threshold))
    }

    /// Keep the right-hand strip of the image.
    pub fn right_crop(&self, image: &DynamicImage) -> DynamicImage {
        let fraction = self
            .right_crop_fraction
            .clamp(MIN_CROP_FRACTION, MAX_CROP_FRACTION);
        let (width, height) = (image.width(), image.height());

        let crop_width = ((width as f32 * fraction).round() as u32).clamp(1, width.max(1));
        let x = width.saturating_sub(crop_width);

        image.crop_imm(x, 0, crop_width, height)
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode an image as PNG for handing to an external engine.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, OcrError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| OcrError::Preprocessing(e.to_string()))?;
    Ok(buf)
}

fn calculate_upscale_dimensions(width: u32, height: u32, target: u32) -> (u32, u32) {
    let max_dim = width.max(height);
    if max_dim == 0 || max_dim >= target {
        return (width, height);
    }

    let scale = target as f32 / max_dim as f32;
    let new_width = (width as f32 * scale).round() as u32;
    let new_height = (height as f32 * scale).round() as u32;

    (new_width.max(1), new_height.max(1))
}

/// Stretch luminance so the darkest pixel becomes 0 and the brightest 255.
fn autocontrast(gray: GrayImage) -> GrayImage {
    let (min_px, max_px) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(mn, mx), p| (mn.min(p[0]), mx.max(p[0])));

    if max_px <= min_px {
        return gray;
    }

    let range = (max_px - min_px) as u32;
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Luma([((p - min_px) as u32 * 255 / range) as u8])
    })
}

fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}
