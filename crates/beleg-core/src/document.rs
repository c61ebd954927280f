//! Document kinds and upload validation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BelegError, DocumentError};

/// Declared or detected kind of an incoming document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Raster image (photo or scan).
    Image,
    /// PDF, born-digital or scanned.
    Pdf,
    /// Anything else; treated as an image on a best-effort basis.
    Unknown,
}

impl DocumentKind {
    /// Map a file extension (without the dot, any case) to a kind.
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "webp" | "gif" => Self::Image,
            _ => Self::Unknown,
        }
    }

    /// Map a file path to a kind by its extension.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Map a media type to a kind.
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_lowercase();
        if mime.starts_with("image/") {
            Self::Image
        } else if mime == "application/pdf" || mime.ends_with("/x-pdf") {
            Self::Pdf
        } else {
            Self::Unknown
        }
    }

    /// Detect the kind from magic bytes.
    pub fn sniff(data: &[u8]) -> Self {
        if data.starts_with(b"%PDF") {
            return Self::Pdf;
        }
        match image::guess_format(data) {
            Ok(format) => {
                debug!("Sniffed image format {:?}", format);
                Self::Image
            }
            Err(_) => Self::Unknown,
        }
    }

    /// Whether the kind is one the pipeline knows how to read.
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Pdf => write!(f, "pdf"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Raw document bytes together with their kind.
#[derive(Debug, Clone)]
pub struct Document {
    /// Raw file content.
    pub data: Vec<u8>,
    /// Declared or detected kind.
    pub kind: DocumentKind,
}

impl Document {
    /// Create a document from bytes and a declared kind.
    pub fn new(data: Vec<u8>, kind: DocumentKind) -> Self {
        Self { data, kind }
    }

    /// Read a document from disk, preferring sniffed content over the extension.
    pub fn from_path(path: &Path) -> Result<Self, BelegError> {
        let data = std::fs::read(path)?;
        let kind = match DocumentKind::sniff(&data) {
            DocumentKind::Unknown => DocumentKind::from_path(path),
            sniffed => sniffed,
        };
        debug!("Loaded {} ({} bytes) as {}", path.display(), data.len(), kind);
        Ok(Self { data, kind })
    }
}

/// Validate an incoming document the way an upload endpoint would.
///
/// The content is sniffed first; the file name's extension is the fallback
/// for content that cannot be identified from its first bytes.
pub fn validate_upload(
    data: &[u8],
    file_name: &str,
    max_bytes: usize,
) -> Result<DocumentKind, DocumentError> {
    if data.is_empty() {
        return Err(DocumentError::Empty);
    }
    if data.len() > max_bytes {
        return Err(DocumentError::TooLarge {
            size: data.len(),
            limit: max_bytes,
        });
    }

    let sniffed = DocumentKind::sniff(data);
    if sniffed.is_supported() {
        return Ok(sniffed);
    }

    let by_name = DocumentKind::from_path(Path::new(file_name));
    if by_name.is_supported() {
        debug!("Accepting {} by extension as {}", file_name, by_name);
        return Ok(by_name);
    }

    Err(DocumentError::Unsupported(file_name.to_string()))
}
