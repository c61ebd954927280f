//! Configuration structures for the receipt pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{BelegError, Result};

/// Main configuration for the beleg pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BelegConfig {
    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// Image preprocessing configuration.
    pub preprocess: PreprocessConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Limits applied to incoming documents.
    pub upload: UploadConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract executable name or path.
    pub tesseract_binary: String,

    /// Tesseract language string (e.g. "deu+eng").
    pub language: String,

    /// Optional tessdata directory.
    pub tessdata_dir: Option<PathBuf>,

    /// Run page orientation detection before recognition.
    pub detect_orientation: bool,

    /// Minimum orientation confidence required before an image is rotated.
    pub min_orientation_confidence: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_binary: "tesseract".to_string(),
            language: "deu+eng".to_string(),
            tessdata_dir: None,
            detect_orientation: true,
            min_orientation_confidence: 2.0,
        }
    }
}

/// Image preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Images whose longer side is below this are upscaled to it.
    pub upscale_target: u32,

    /// Luminance threshold used for binarization (0-255).
    pub binarize_threshold: u8,

    /// Fraction of the width kept by the right-hand price column crop.
    pub right_crop_fraction: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            upscale_target: 1800,
            binarize_threshold: 160,
            right_crop_fraction: 0.45,
        }
    }
}

/// Which implementation handles PDF text layers and rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfBackendKind {
    /// Poppler command line tools (`pdftotext`, `pdftoppm`).
    Poppler,
    /// In-process extraction via pdf-extract and lopdf.
    Native,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Backend used for PDF documents.
    pub backend: PdfBackendKind,

    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,

    /// Maximum pages to OCR (0 = unlimited).
    pub max_pages: usize,

    /// Minimum trimmed text length to accept an embedded text layer.
    pub min_text_chars: usize,

    /// `pdftotext` executable name or path.
    pub pdftotext_binary: String,

    /// `pdftoppm` executable name or path.
    pub pdftoppm_binary: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            backend: PdfBackendKind::Poppler,
            render_dpi: 450,
            max_pages: 0,
            min_text_chars: 20,
            pdftotext_binary: "pdftotext".to_string(),
            pdftoppm_binary: "pdftoppm".to_string(),
        }
    }
}

/// Limits applied to incoming documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum document size in megabytes.
    pub max_upload_mb: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self { max_upload_mb: 25 }
    }
}

impl UploadConfig {
    /// Size limit in bytes.
    pub fn max_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl BelegConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| BelegError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| BelegError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `OCR_LANG` and `MAX_UPLOAD_MB` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(lang) = lookup("OCR_LANG").filter(|v| !v.trim().is_empty()) {
            self.ocr.language = lang.trim().to_string();
        }
        if let Some(mb) = lookup("MAX_UPLOAD_MB").and_then(|v| v.trim().parse().ok()) {
            self.upload.max_upload_mb = mb;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = BelegConfig::default();
        assert_eq!(config.ocr.language, "deu+eng");
        assert_eq!(config.pdf.render_dpi, 450);
        assert_eq!(config.pdf.min_text_chars, 20);
        assert_eq!(config.upload.max_bytes(), 25 * 1024 * 1024);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BelegConfig =
            serde_json::from_str(r#"{"pdf": {"backend": "native", "render_dpi": 300}}"#).unwrap();
        assert_eq!(config.pdf.backend, PdfBackendKind::Native);
        assert_eq!(config.pdf.render_dpi, 300);
        assert_eq!(config.pdf.min_text_chars, 20);
        assert_eq!(config.preprocess.upscale_target, 1800);
    }

    #[test]
    fn test_overrides() {
        let config = BelegConfig::default().with_overrides(|key| match key {
            "OCR_LANG" => Some("fra".to_string()),
            "MAX_UPLOAD_MB" => Some("5".to_string()),
            _ => None,
        });
        assert_eq!(config.ocr.language, "fra");
        assert_eq!(config.upload.max_upload_mb, 5);
    }

    #[test]
    fn test_huge_upload_limit_saturates() {
        let config = BelegConfig::default().with_overrides(|key| match key {
            "MAX_UPLOAD_MB" => Some(usize::MAX.to_string()),
            _ => None,
        });
        assert_eq!(config.upload.max_bytes(), usize::MAX);
    }

    #[test]
    fn test_invalid_override_is_ignored() {
        let config = BelegConfig::default().with_overrides(|key| match key {
            "MAX_UPLOAD_MB" => Some("lots".to_string()),
            "OCR_LANG" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.upload.max_upload_mb, 25);
        assert_eq!(config.ocr.language, "deu+eng");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BelegConfig::default();
        config.preprocess.binarize_threshold = 180;
        config.save(&path).unwrap();

        let loaded = BelegConfig::from_file(&path).unwrap();
        assert_eq!(loaded.preprocess.binarize_threshold, 180);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            BelegConfig::from_file(&path),
            Err(BelegError::Config(_))
        ));
        assert!(matches!(
            BelegConfig::from_file(&dir.path().join("missing.json")),
            Err(BelegError::Io(_))
        ));
    }
}
