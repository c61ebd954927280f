//! Receipt fact parser.

use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::models::receipt::ReceiptFacts;

use super::rules::{merchants::extract_merchant, ExtractionMatch, FieldExtractor, TotalExtractor};

/// Facts together with how the total was found.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// Parsed facts.
    pub facts: ReceiptFacts,
    /// The winning total match, if any.
    pub total_match: Option<ExtractionMatch<Decimal>>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Derives merchant and total from receipt text.
///
/// Parsing never fails: text without recognizable facts yields empty facts.
/// The parser holds no state between calls and is cheap to share.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReceiptParser;

impl ReceiptParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse merchant and total from text.
    pub fn parse(&self, text: &str) -> ReceiptFacts {
        self.parse_detailed(text).facts
    }

    /// Parse and keep the winning total match for diagnostics.
    pub fn parse_detailed(&self, text: &str) -> ParseOutcome {
        let start = Instant::now();
        debug!("Parsing receipt from {} characters of text", text.len());

        let merchant = extract_merchant(text);
        let total_match = TotalExtractor::new().extract(text);

        let facts = ReceiptFacts {
            merchant,
            total: total_match.as_ref().map(|m| m.value),
        };

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Parsed receipt: merchant={:?} total={:?} rule={:?} in {}ms",
            facts.merchant_name(),
            facts.total,
            total_match.as_ref().map(|m| m.source.as_str()),
            processing_time_ms
        );

        ParseOutcome {
            facts,
            total_match,
            processing_time_ms,
        }
    }
}

/// Parse receipt text with the default parser.
pub fn parse(text: &str) -> ReceiptFacts {
    ReceiptParser::new().parse(text)
}
