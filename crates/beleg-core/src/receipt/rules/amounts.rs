//! Total amount extraction for receipts.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, trace};

use super::patterns::{total_patterns, DECIMAL_TAIL, LINE_TOTAL_KEYWORD, NUMERIC_TOKEN};
use super::{ExtractionMatch, FieldExtractor};

/// Rule name recorded for totals found by the line scan.
pub const LINE_SCAN_RULE: &str = "line_scan";

/// Locates the amount due on a receipt.
///
/// Labeled patterns are tried first across the whole text and the mention
/// with the largest offset wins. Only when none of them match does the
/// extractor fall back to scanning lines that carry a total keyword.
pub struct TotalExtractor;

impl TotalExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Every labeled total candidate, in pattern order then text order.
    pub fn labeled_candidates(&self, text: &str) -> Vec<ExtractionMatch<Decimal>> {
        let mut candidates = Vec::new();

        for (rule, pattern) in total_patterns() {
            for caps in pattern.captures_iter(text) {
                let (Some(full), Some(raw)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                match normalize_amount(raw.as_str()) {
                    Some(value) => candidates.push(
                        ExtractionMatch::new(value, 0.95, rule)
                            .with_position(full.start(), full.end()),
                    ),
                    None => trace!("Discarding unparsable amount {:?}", raw.as_str()),
                }
            }
        }

        candidates
    }

    /// Line scan used when no labeled pattern matched.
    pub fn scan_lines(&self, text: &str) -> Option<ExtractionMatch<Decimal>> {
        let mut line_start = 0;

        for line in text.split('\n') {
            let offset = line_start;
            line_start += line.len() + 1;

            if !LINE_TOTAL_KEYWORD.is_match(line) {
                continue;
            }

            let rightmost = NUMERIC_TOKEN
                .find_iter(line)
                .filter(|m| DECIMAL_TAIL.is_match(m.as_str()))
                .filter_map(|m| normalize_amount(m.as_str()).map(|v| (m, v)))
                .last();

            if let Some((m, value)) = rightmost {
                debug!("Line scan found total {} in {:?}", value, line.trim());
                return Some(
                    ExtractionMatch::new(value, 0.7, LINE_SCAN_RULE)
                        .with_position(offset + m.start(), offset + m.end()),
                );
            }
        }

        None
    }
}

impl Default for TotalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TotalExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let candidates = self.labeled_candidates(text);
        if candidates.is_empty() {
            return self.scan_lines(text);
        }

        debug!("Found {} labeled total candidates", candidates.len());
        // max_by_key keeps the last of equal keys, so at a shared offset the
        // later pattern wins.
        candidates
            .into_iter()
            .max_by_key(|c| c.position.map(|(start, _)| start).unwrap_or(0))
    }
}

/// Extract the total amount from receipt text.
pub fn extract_total(text: &str) -> Option<Decimal> {
    TotalExtractor::new().extract(text).map(|m| m.value)
}

/// Normalize a raw amount such as "1'234.56", "1 234,56" or "34,65".
///
/// Spaces and apostrophes are thousands separators. When both "." and ","
/// occur, "." groups thousands and "," is the decimal mark; a lone "," is the
/// decimal mark; a lone "." is kept.
pub fn normalize_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{00a0}' | '\''))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.contains('.'), cleaned.contains(',')) {
        (true, true) => cleaned.replace('.', "").replace(',', "."),
        (false, true) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_normalize_amount() {
        assert_eq!(normalize_amount("1'234.56"), Some(dec("1234.56")));
        assert_eq!(normalize_amount("1 234,56"), Some(dec("1234.56")));
        assert_eq!(normalize_amount("34,65"), Some(dec("34.65")));
        assert_eq!(normalize_amount("34.65"), Some(dec("34.65")));
        assert_eq!(normalize_amount("1.234,56"), Some(dec("1234.56")));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(normalize_amount(""), None);
        assert_eq!(normalize_amount("12.345.67"), None);
        assert_eq!(normalize_amount("1\n234.56"), None);
    }

    #[test]
    fn test_later_offset_wins() {
        let text = "Zwischensumme: 20.00\nMwSt 7.7% 1.43\nTotal CHF 34.65\n";
        assert_eq!(extract_total(text), Some(dec("34.65")));
    }

    #[test]
    fn test_standalone_currency_line_after_label() {
        let text = "TOTAL 30.00\nRabatt -5.00\nCHF 25.00\nBar 50.00";
        assert_eq!(extract_total(text), Some(dec("25.00")));
    }

    #[test]
    fn test_swiss_grouping() {
        assert_eq!(extract_total("Total CHF 1'234.50"), Some(dec("1234.50")));
        assert_eq!(extract_total("Summe 1.234,50 EUR"), Some(dec("1234.50")));
    }

    #[test]
    fn test_candidates_record_rule_and_offset() {
        let text = "Summe 10.00\nTotal 12.00 CHF";
        let candidates = TotalExtractor::new().labeled_candidates(text);

        assert!(candidates.iter().any(|c| c.source == "label_amount_currency"));
        let best = TotalExtractor::new().extract(text).unwrap();
        assert_eq!(best.value, dec("12.00"));
        assert_eq!(best.position.unwrap().0, 12);
    }

    #[test]
    fn test_line_scan_takes_rightmost_amount() {
        // The dotted leader defeats the labeled patterns.
        let text = "Artikel 3\nTOTAL ........ 12.00   34.65\nBar 50.00";
        let found = TotalExtractor::new().extract(text).unwrap();
        assert_eq!(found.value, dec("34.65"));
        assert_eq!(found.source, LINE_SCAN_RULE);
    }

    #[test]
    fn test_line_scan_skips_keyword_lines_without_amounts() {
        let text = "Gesamt (inkl. MwSt)\nArtikel 2\nTotal - - - 8.90";
        assert_eq!(extract_total(text), Some(dec("8.90")));
    }

    #[test]
    fn test_line_scan_ignores_three_decimal_tokens() {
        let text = "Total ( 1.500 kg ) 4,20";
        assert_eq!(
            TotalExtractor::new().scan_lines(text).map(|m| m.value),
            Some(dec("4.20"))
        );
    }

    #[test]
    fn test_no_total_is_none() {
        assert_eq!(extract_total("Vielen Dank fuer Ihren Einkauf"), None);
        assert_eq!(extract_total(""), None);
    }
}
