//! Document to receipt facts.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::document::{Document, DocumentKind};
use crate::error::Result;
use crate::extraction::{EngineHealth, TextExtractor, TextSource};
use crate::models::receipt::ReceiptFacts;
use crate::ocr::OcrBackend;
use crate::pdf::PdfBackend;
use crate::receipt::ReceiptParser;

/// Text and facts for one document.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptOutcome {
    pub text: String,
    pub source: TextSource,
    #[serde(flatten)]
    pub facts: ReceiptFacts,
    pub engine_errors: usize,
}

/// Runs text extraction and fact parsing back to back.
///
/// Holds no per-document state, so one pipeline can serve many threads.
pub struct ReceiptPipeline<B: OcrBackend, P: PdfBackend> {
    extractor: TextExtractor<B, P>,
    parser: ReceiptParser,
}

impl<B: OcrBackend, P: PdfBackend> ReceiptPipeline<B, P> {
    pub fn new(extractor: TextExtractor<B, P>) -> Self {
        Self {
            extractor,
            parser: ReceiptParser::new(),
        }
    }

    /// Extract and parse a document. Never fails.
    pub fn process(&self, data: &[u8], kind: DocumentKind) -> ReceiptOutcome {
        let extraction = self.extractor.extract_detailed(data, kind);
        let facts = self.parser.parse(&extraction.text);

        info!(
            "Receipt processed: merchant={:?} total={:?}",
            facts.merchant_name(),
            facts.total
        );

        ReceiptOutcome {
            text: extraction.text,
            source: extraction.source,
            facts,
            engine_errors: extraction.engine_errors,
        }
    }

    pub fn process_document(&self, document: &Document) -> ReceiptOutcome {
        self.process(&document.data, document.kind)
    }

    /// Read a file and process it. Only reading the file can fail.
    pub fn process_file(&self, path: &Path) -> Result<ReceiptOutcome> {
        let document = Document::from_path(path)?;
        Ok(self.process_document(&document))
    }

    pub fn health(&self) -> EngineHealth {
        self.extractor.health()
    }
}

#[cfg(feature = "native")]
mod native {
    use super::ReceiptPipeline;
    use crate::extraction::TextExtractor;
    use crate::models::config::BelegConfig;
    use crate::ocr::{OcrEngine, TesseractCli};
    use crate::pdf::PdfTools;

    /// Pipeline over Tesseract and the configured PDF backend.
    pub type NativePipeline = ReceiptPipeline<TesseractCli, PdfTools>;

    impl ReceiptPipeline<TesseractCli, PdfTools> {
        /// Build the pipeline described by a configuration.
        pub fn from_config(config: &BelegConfig) -> Self {
            let engine = OcrEngine::builder(TesseractCli::from_config(&config.ocr))
                .with_ocr_config(&config.ocr)
                .with_preprocess_config(&config.preprocess)
                .build();
            let pdf = PdfTools::from_config(&config.pdf);

            Self::new(TextExtractor::with_pdf_config(engine, pdf, &config.pdf))
        }
    }
}

#[cfg(feature = "native")]
pub use native::NativePipeline;
