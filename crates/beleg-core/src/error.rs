//! Error types for the beleg-core library.
//!
//! These errors stay inside the library: the text extraction engine and the
//! receipt parser log them and degrade to empty or absent values. They surface
//! only from the explicitly fallible helpers (loading a document, probing an
//! engine, reading configuration).

use thiserror::Error;

/// Main error type for the beleg library.
#[derive(Error, Debug)]
pub enum BelegError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Document validation error.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract the embedded text layer.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to turn pages into raster images.
    #[error("failed to rasterize pages: {0}")]
    Rasterize(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// An external PDF tool could not be run or exited unsuccessfully.
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    /// I/O error while staging the document for an external tool.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The recognition engine is missing or cannot be started.
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    /// The engine ran but reported a failure.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Page orientation detection failed.
    #[error("orientation detection failed: {0}")]
    Orientation(String),

    /// Image preprocessing or encoding failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),
}

/// Errors raised while accepting a document from a caller.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// No bytes were supplied.
    #[error("document is empty")]
    Empty,

    /// The document exceeds the configured size limit.
    #[error("document too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    /// Neither the content nor the file name identify an image or a PDF.
    #[error("unsupported document type: {0}")]
    Unsupported(String),
}

/// Result type for the beleg library.
pub type Result<T> = std::result::Result<T, BelegError>;
