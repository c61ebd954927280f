//! Text extraction from receipt documents.
//!
//! Born-digital PDFs are read from their text layer. Everything else goes
//! through OCR. Extraction never fails: engine errors are logged, counted in
//! [`Extraction::engine_errors`], and degrade to shorter or empty text. Whether
//! the engines are installed at all is answered separately by
//! [`TextExtractor::health`].

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::document::DocumentKind;
use crate::models::config::PdfConfig;
use crate::ocr::{OcrBackend, OcrEngine};
use crate::pdf::PdfBackend;

/// Separator between the texts of consecutive PDF pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Where extracted text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// The PDF's embedded text layer.
    EmbeddedText,
    /// Optical character recognition.
    Ocr,
    /// Nothing could be read.
    Empty,
}

/// Extracted text with provenance.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub text: String,
    pub source: TextSource,
    /// Pages or images run through OCR.
    pub pages: usize,
    /// Engine failures caught during this extraction.
    pub engine_errors: usize,
    pub processing_time_ms: u64,
}

impl Extraction {
    fn empty(engine_errors: usize) -> Self {
        Self {
            text: String::new(),
            source: TextSource::Empty,
            pages: 0,
            engine_errors,
            processing_time_ms: 0,
        }
    }
}

/// Availability of one engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentHealth {
    pub available: bool,
    /// Version string when available, error message otherwise.
    pub detail: String,
}

impl<E: std::fmt::Display> From<Result<String, E>> for ComponentHealth {
    fn from(result: Result<String, E>) -> Self {
        match result {
            Ok(detail) => Self {
                available: true,
                detail,
            },
            Err(e) => Self {
                available: false,
                detail: e.to_string(),
            },
        }
    }
}

/// Availability of the OCR engine and the PDF tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineHealth {
    pub ocr: ComponentHealth,
    pub pdf: ComponentHealth,
}

impl EngineHealth {
    pub fn is_healthy(&self) -> bool {
        self.ocr.available && self.pdf.available
    }
}

/// Turns document bytes into plain text.
pub struct TextExtractor<B: OcrBackend, P: PdfBackend> {
    ocr: OcrEngine<B>,
    pdf: P,
    render_dpi: u32,
    max_pages: usize,
    min_text_chars: usize,
}

impl<B: OcrBackend, P: PdfBackend> TextExtractor<B, P> {
    /// Create an extractor with default PDF settings.
    pub fn new(ocr: OcrEngine<B>, pdf: P) -> Self {
        Self::with_pdf_config(ocr, pdf, &PdfConfig::default())
    }

    pub fn with_pdf_config(ocr: OcrEngine<B>, pdf: P, config: &PdfConfig) -> Self {
        Self {
            ocr,
            pdf,
            render_dpi: config.render_dpi,
            max_pages: config.max_pages,
            min_text_chars: config.min_text_chars,
        }
    }

    /// Limit the pages run through OCR (0 = all).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn ocr(&self) -> &OcrEngine<B> {
        &self.ocr
    }

    pub fn pdf(&self) -> &P {
        &self.pdf
    }

    /// Extract text, degrading to an empty string on any failure.
    pub fn extract(&self, data: &[u8], kind: DocumentKind) -> String {
        self.extract_detailed(data, kind).text
    }

    /// Extract text and report where it came from.
    pub fn extract_detailed(&self, data: &[u8], kind: DocumentKind) -> Extraction {
        let start = Instant::now();
        info!("Extracting text from {} bytes ({})", data.len(), kind);

        let mut extraction = match kind {
            DocumentKind::Pdf => self.extract_pdf(data),
            DocumentKind::Image | DocumentKind::Unknown => self.extract_image(data),
        };
        extraction.processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Extracted {} chars via {:?} in {}ms ({} engine errors)",
            extraction.text.len(),
            extraction.source,
            extraction.processing_time_ms,
            extraction.engine_errors
        );
        extraction
    }

    /// Probe both engines.
    pub fn health(&self) -> EngineHealth {
        EngineHealth {
            ocr: self.ocr.backend().probe().into(),
            pdf: self.pdf.probe().into(),
        }
    }

    fn extract_image(&self, data: &[u8]) -> Extraction {
        let image = match image::load_from_memory(data) {
            Ok(image) => image,
            Err(e) => {
                warn!("Could not decode image: {}", e);
                return Extraction::empty(0);
            }
        };

        let result = self.ocr.process(&image);
        let engine_errors = result.failed_attempts();
        Extraction {
            source: source_for(&result.text),
            text: result.text,
            pages: 1,
            engine_errors,
            processing_time_ms: 0,
        }
    }

    fn extract_pdf(&self, data: &[u8]) -> Extraction {
        let mut engine_errors = 0;

        match self.pdf.extract_text_layer(data) {
            Ok(text) if text.trim().chars().count() >= self.min_text_chars => {
                debug!("Using embedded text layer ({} chars)", text.len());
                return Extraction {
                    text,
                    source: TextSource::EmbeddedText,
                    pages: 0,
                    engine_errors,
                    processing_time_ms: 0,
                };
            }
            Ok(text) => debug!(
                "Text layer too short ({} chars), falling back to OCR",
                text.trim().chars().count()
            ),
            Err(e) => {
                warn!("Text layer extraction failed: {}", e);
                engine_errors += 1;
            }
        }

        let mut pages = match self.pdf.rasterize(data, self.render_dpi) {
            Ok(pages) => pages,
            Err(e) => {
                warn!("Rasterization failed: {}", e);
                return Extraction::empty(engine_errors + 1);
            }
        };
        if self.max_pages > 0 && pages.len() > self.max_pages {
            debug!("Limiting OCR to {} of {} pages", self.max_pages, pages.len());
            pages.truncate(self.max_pages);
        }

        let mut texts = Vec::with_capacity(pages.len());
        for (index, page) in pages.iter().enumerate() {
            let result = self.ocr.process(page);
            debug!("Page {}: {} chars", index + 1, result.text.len());
            engine_errors += result.failed_attempts();
            texts.push(result.text);
        }

        let text = texts.join(PAGE_SEPARATOR);
        Extraction {
            source: source_for(&text),
            text,
            pages: pages.len(),
            engine_errors,
            processing_time_ms: 0,
        }
    }
}

fn source_for(text: &str) -> TextSource {
    if text.trim().is_empty() {
        TextSource::Empty
    } else {
        TextSource::Ocr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{ImagePreprocessor, RecognitionConfig};
    use crate::testing::{png_bytes, ScriptedRecognizer, StaticPdf};
    use pretty_assertions::assert_eq;

    fn extractor(
        recognizer: ScriptedRecognizer,
        pdf: StaticPdf,
    ) -> TextExtractor<ScriptedRecognizer, StaticPdf> {
        let engine = OcrEngine::builder(recognizer)
            .with_preprocessor(ImagePreprocessor::new().with_upscale_target(64))
            .build();
        TextExtractor::new(engine, pdf)
    }

    #[test]
    fn test_text_layer_is_returned_verbatim() {
        let layer = "  COOP\n   Total CHF     12.90\n\n";
        let extractor = extractor(ScriptedRecognizer::new("ocr text"), StaticPdf::with_text(layer));

        let extraction = extractor.extract_detailed(b"%PDF-1.4", DocumentKind::Pdf);

        assert_eq!(extraction.text, layer);
        assert_eq!(extraction.source, TextSource::EmbeddedText);
        assert_eq!(extractor.pdf().rasterize_calls(), 0);
        assert!(extractor.ocr().backend().calls().is_empty());
    }

    #[test]
    fn test_short_text_layer_falls_back_to_ocr() {
        let extractor = extractor(
            ScriptedRecognizer::new("LIDL\nSumme 3.20"),
            StaticPdf::with_text("page 1"),
        );

        let extraction = extractor.extract_detailed(b"%PDF-1.4", DocumentKind::Pdf);

        assert_eq!(extraction.text, "LIDL\nSumme 3.20");
        assert_eq!(extraction.source, TextSource::Ocr);
        assert_eq!(extractor.pdf().rasterize_calls(), 1);
    }

    #[test]
    fn test_scanned_pages_are_joined() {
        let extractor = extractor(ScriptedRecognizer::new("page text"), StaticPdf::scanned(3));

        let extraction = extractor.extract_detailed(b"%PDF-1.4", DocumentKind::Pdf);

        assert_eq!(extraction.text, "page text\n\npage text\n\npage text");
        assert_eq!(extraction.pages, 3);
    }

    #[test]
    fn test_max_pages_limits_ocr() {
        let extractor = extractor(ScriptedRecognizer::new("p"), StaticPdf::scanned(3)).with_max_pages(1);
        assert_eq!(extractor.extract(b"%PDF-1.4", DocumentKind::Pdf), "p");
    }

    #[test]
    fn test_pdf_failures_degrade_to_empty() {
        let extractor = extractor(ScriptedRecognizer::new("unused"), StaticPdf::failing("broken"));

        let extraction = extractor.extract_detailed(b"%PDF-1.4", DocumentKind::Pdf);

        assert_eq!(extraction.text, "");
        assert_eq!(extraction.source, TextSource::Empty);
        assert_eq!(extraction.engine_errors, 2);
    }

    #[test]
    fn test_corrupt_image_is_empty() {
        let extractor = extractor(ScriptedRecognizer::new("unused"), StaticPdf::scanned(1));

        for kind in [DocumentKind::Image, DocumentKind::Unknown] {
            assert_eq!(extractor.extract(b"\x89PNG\r\n\x1a\ntruncated", kind), "");
        }
        assert!(extractor.ocr().backend().calls().is_empty());
    }

    #[test]
    fn test_unknown_kind_is_read_as_image() {
        let recognizer = ScriptedRecognizer::new("")
            .respond(&RecognitionConfig::BLOCK, "ALDI SUISSE\nTOTAL 9.95");
        let extractor = extractor(recognizer, StaticPdf::scanned(1));

        let extraction = extractor.extract_detailed(&png_bytes(24, 36), DocumentKind::Unknown);

        assert_eq!(extraction.text, "ALDI SUISSE\nTOTAL 9.95");
        assert_eq!(extraction.source, TextSource::Ocr);
        assert_eq!(extraction.pages, 1);
    }

    #[test]
    fn test_engine_outage_is_visible() {
        let extractor = extractor(ScriptedRecognizer::failing("tesseract: not found"), StaticPdf::scanned(1));

        let extraction = extractor.extract_detailed(&png_bytes(24, 36), DocumentKind::Image);
        assert_eq!(extraction.text, "");
        assert_eq!(extraction.engine_errors, 5);

        let health = extractor.health();
        assert!(!health.ocr.available);
        assert!(health.pdf.available);
        assert!(!health.is_healthy());
    }
}
