//! Core library for receipt OCR.
//!
//! This crate provides:
//! - Text extraction from receipt photos and PDFs (embedded text layer first,
//!   multi-attempt Tesseract OCR otherwise)
//! - Fact parsing: merchant chain and total amount from noisy OCR text
//! - Document kind detection and upload validation
//! - A pipeline composing both stages

pub mod document;
pub mod error;
pub mod extraction;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod receipt;

#[cfg(test)]
pub(crate) mod testing;

pub use document::{validate_upload, Document, DocumentKind};
pub use error::{BelegError, DocumentError, OcrError, PdfError, Result};
pub use extraction::{ComponentHealth, EngineHealth, Extraction, TextExtractor, TextSource};
pub use models::config::BelegConfig;
pub use models::receipt::{Merchant, ReceiptFacts};
pub use ocr::{OcrBackend, OcrEngine, OcrResult, RecognitionConfig};
#[cfg(feature = "native")]
pub use ocr::TesseractCli;
pub use pdf::{NativePdfBackend, PdfBackend, PdfTools};
#[cfg(feature = "native")]
pub use pdf::PopplerBackend;
pub use pipeline::{ReceiptOutcome, ReceiptPipeline};
#[cfg(feature = "native")]
pub use pipeline::NativePipeline;
pub use receipt::{parse, ParseOutcome, ReceiptParser};
