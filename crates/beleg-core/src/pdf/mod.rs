//! PDF processing: embedded text layers and page rasterization.

mod native;
#[cfg(feature = "native")]
mod poppler;

pub use native::NativePdfBackend;
#[cfg(feature = "native")]
pub use poppler::PopplerBackend;

use image::DynamicImage;

use crate::error::PdfError;
use crate::models::config::{PdfBackendKind, PdfConfig};

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text layer extraction and page rasterization for PDF documents.
pub trait PdfBackend: Send + Sync {
    /// Extract the embedded text layer, preserving layout where possible.
    fn extract_text_layer(&self, data: &[u8]) -> Result<String>;

    /// Render every page to an image, in page order.
    fn rasterize(&self, data: &[u8], dpi: u32) -> Result<Vec<DynamicImage>>;

    /// Check that the backend can run, returning a short description.
    fn probe(&self) -> Result<String>;
}

/// PDF backend chosen from configuration.
pub enum PdfTools {
    #[cfg(feature = "native")]
    Poppler(PopplerBackend),
    Native(NativePdfBackend),
}

impl PdfTools {
    /// Build the backend named by `pdf.backend`.
    pub fn from_config(config: &PdfConfig) -> Self {
        match config.backend {
            #[cfg(feature = "native")]
            PdfBackendKind::Poppler => Self::Poppler(PopplerBackend::from_config(config)),
            #[cfg(not(feature = "native"))]
            PdfBackendKind::Poppler => {
                tracing::warn!("Poppler backend needs the `native` feature, using in-process PDF handling");
                Self::Native(NativePdfBackend::new())
            }
            PdfBackendKind::Native => Self::Native(NativePdfBackend::new()),
        }
    }

    fn inner(&self) -> &dyn PdfBackend {
        match self {
            #[cfg(feature = "native")]
            Self::Poppler(backend) => backend,
            Self::Native(backend) => backend,
        }
    }
}

impl PdfBackend for PdfTools {
    fn extract_text_layer(&self, data: &[u8]) -> Result<String> {
        self.inner().extract_text_layer(data)
    }

    fn rasterize(&self, data: &[u8], dpi: u32) -> Result<Vec<DynamicImage>> {
        self.inner().rasterize(data, dpi)
    }

    fn probe(&self) -> Result<String> {
        self.inner().probe()
    }
}
