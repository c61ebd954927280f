//! Rule-based field extractors for receipts.

pub mod amounts;
pub mod merchants;
pub mod patterns;

pub use amounts::{extract_total, normalize_amount, TotalExtractor};
pub use merchants::{detect_merchant, extract_merchant, MerchantEntry, MERCHANTS};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;
}

/// A matched value together with where and how it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Byte span of the match in the source text.
    pub position: Option<(usize, usize)>,
    /// Name of the rule that produced the match.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
