//! Deterministic stand-ins for the OCR engine and PDF tools.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use image::{DynamicImage, Rgb, RgbImage};

use crate::error::{OcrError, PdfError};
use crate::ocr::{OcrBackend, OrientationEstimate, RecognitionConfig};
use crate::pdf::PdfBackend;

/// A white RGB image.
pub fn blank_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
}

/// PNG bytes of a white image.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    blank_image(width, height)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Recognizer answering from a script keyed by recognition config.
pub struct ScriptedRecognizer {
    default: Result<String, String>,
    responses: Vec<(RecognitionConfig, Result<String, String>)>,
    orientation: Result<OrientationEstimate, String>,
    calls: Mutex<Vec<RecognitionConfig>>,
}

impl ScriptedRecognizer {
    /// Answer `text` for every config without a scripted response.
    pub fn new(text: &str) -> Self {
        Self {
            default: Ok(text.to_string()),
            responses: Vec::new(),
            orientation: Ok(OrientationEstimate {
                rotate: 0,
                confidence: 0.0,
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call, including probing, as a missing engine would.
    pub fn failing(message: &str) -> Self {
        Self {
            default: Err(message.to_string()),
            orientation: Err(message.to_string()),
            ..Self::new("")
        }
    }

    pub fn respond(mut self, config: &RecognitionConfig, text: &str) -> Self {
        self.responses.push((*config, Ok(text.to_string())));
        self
    }

    pub fn fail(mut self, config: &RecognitionConfig, message: &str) -> Self {
        self.responses.push((*config, Err(message.to_string())));
        self
    }

    pub fn with_orientation(mut self, rotate: u32, confidence: f32) -> Self {
        self.orientation = Ok(OrientationEstimate { rotate, confidence });
        self
    }

    pub fn with_orientation_error(mut self, message: &str) -> Self {
        self.orientation = Err(message.to_string());
        self
    }

    /// Configs passed to `recognize`, in call order.
    pub fn calls(&self) -> Vec<RecognitionConfig> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl OcrBackend for ScriptedRecognizer {
    fn recognize(&self, _image: &DynamicImage, config: &RecognitionConfig) -> Result<String, OcrError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(*config);
        }

        let scripted = self
            .responses
            .iter()
            .find(|(c, _)| c == config)
            .map(|(_, r)| r)
            .unwrap_or(&self.default);

        scripted.clone().map_err(OcrError::Recognition)
    }

    fn detect_orientation(&self, _image: &DynamicImage) -> Result<OrientationEstimate, OcrError> {
        self.orientation.clone().map_err(OcrError::Orientation)
    }

    fn probe(&self) -> Result<String, OcrError> {
        match &self.default {
            Ok(_) => Ok("scripted".to_string()),
            Err(message) => Err(OcrError::Unavailable(message.clone())),
        }
    }
}

/// PDF backend returning a fixed text layer and fixed page images.
pub struct StaticPdf {
    text: Result<String, String>,
    pages: Result<Vec<DynamicImage>, String>,
    rasterize_calls: AtomicUsize,
}

impl StaticPdf {
    /// A born-digital PDF with the given text layer.
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Ok(text.to_string()),
            pages: Ok(vec![blank_image(20, 30)]),
            rasterize_calls: AtomicUsize::new(0),
        }
    }

    /// A scanned PDF: no text layer and `count` page images.
    pub fn scanned(count: usize) -> Self {
        Self {
            text: Ok(String::new()),
            pages: Ok((0..count).map(|_| blank_image(20, 30)).collect()),
            rasterize_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            text: Err(message.to_string()),
            pages: Err(message.to_string()),
            rasterize_calls: AtomicUsize::new(0),
        }
    }

    pub fn rasterize_calls(&self) -> usize {
        self.rasterize_calls.load(Ordering::SeqCst)
    }
}

impl PdfBackend for StaticPdf {
    fn extract_text_layer(&self, _data: &[u8]) -> Result<String, PdfError> {
        self.text.clone().map_err(PdfError::TextExtraction)
    }

    fn rasterize(&self, _data: &[u8], _dpi: u32) -> Result<Vec<DynamicImage>, PdfError> {
        self.rasterize_calls.fetch_add(1, Ordering::SeqCst);
        self.pages.clone().map_err(PdfError::Rasterize)
    }

    fn probe(&self) -> Result<String, PdfError> {
        match &self.pages {
            Ok(_) => Ok("static".to_string()),
            Err(message) => Err(PdfError::Tool {
                tool: "static".to_string(),
                message: message.clone(),
            }),
        }
    }
}
