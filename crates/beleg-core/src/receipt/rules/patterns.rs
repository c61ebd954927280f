//! Common regex patterns for receipt extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Amount with optional thousands grouping (apostrophe, whitespace, dot or
/// comma) and a two-digit decimal tail. Capture group 1 is the raw amount.
pub const AMOUNT: &str = r"([0-9]{1,3}(?:['\s.,][0-9]{3})*[.,][0-9]{2}|[0-9]+[.,][0-9]{2})";

/// Currency tokens seen on Swiss, German and French receipts.
pub const CURRENCY: &str = r"(?:CHF|Fr\.?|SFr\.?|EUR|€)";

/// Labels that introduce the amount due.
pub const LABEL: &str =
    r"(?:TOTAL|SUMME|GESAMT(?:BETRAG)?|TOTALBETRAG|ZU\s*(?:ZAHLEN|BEZAHLEN)|ZAHLBETRAG)";

lazy_static! {
    // Label, optional ":" or "=", optional currency, amount.
    pub static ref TOTAL_LABEL_AMOUNT: Regex = Regex::new(&format!(
        r"(?i){LABEL}\s*[:=]?\s*(?:{CURRENCY}\s*)?{AMOUNT}"
    )).unwrap();

    // Label, amount, currency.
    pub static ref TOTAL_LABEL_AMOUNT_CURRENCY: Regex = Regex::new(&format!(
        r"(?i){LABEL}\s*[:=]?\s*{AMOUNT}\s*{CURRENCY}"
    )).unwrap();

    // A line holding only a currency token and an amount.
    pub static ref LINE_CURRENCY_AMOUNT: Regex = Regex::new(&format!(
        r"(?im)^{CURRENCY}\s*{AMOUNT}\s*$"
    )).unwrap();

    // A line holding only an amount and a currency token.
    pub static ref LINE_AMOUNT_CURRENCY: Regex = Regex::new(&format!(
        r"(?im)^{AMOUNT}\s*{CURRENCY}\s*$"
    )).unwrap();

    // Standalone total keyword for the line scan.
    pub static ref LINE_TOTAL_KEYWORD: Regex = Regex::new(
        r"(?i)\b(?:TOTAL|SUMME|GESAMT)\b"
    ).unwrap();

    // Numeric token on a line: digits with inner separators.
    pub static ref NUMERIC_TOKEN: Regex = Regex::new(
        r"[0-9](?:[0-9'.,]*[0-9])?"
    ).unwrap();

    // Numeric token that ends in a two-digit decimal tail.
    pub static ref DECIMAL_TAIL: Regex = Regex::new(
        r"[.,][0-9]{2}$"
    ).unwrap();
}

/// Tier-1 total patterns in evaluation order.
pub fn total_patterns() -> [(&'static str, &'static Regex); 4] {
    [
        ("label_amount", &*TOTAL_LABEL_AMOUNT),
        ("label_amount_currency", &*TOTAL_LABEL_AMOUNT_CURRENCY),
        ("line_currency_amount", &*LINE_CURRENCY_AMOUNT),
        ("line_amount_currency", &*LINE_AMOUNT_CURRENCY),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_amount_variants() {
        for text in [
            "TOTAL 34.65",
            "Total: CHF 34.65",
            "SUMME = 34,65",
            "Gesamtbetrag EUR 34,65",
            "ZU ZAHLEN 34.65",
            "zu bezahlen: Fr. 34.65",
            "Zahlbetrag 1'034.65",
        ] {
            let caps = TOTAL_LABEL_AMOUNT
                .captures(text)
                .unwrap_or_else(|| panic!("no match in {text:?}"));
            assert!(caps[1].ends_with("34.65") || caps[1].ends_with("34,65"), "{text:?}");
        }
    }

    #[test]
    fn test_totalbetrag_matches_via_alternation() {
        let caps = TOTAL_LABEL_AMOUNT.captures("TOTALBETRAG: 12.50").unwrap();
        assert_eq!(&caps[1], "12.50");
    }

    #[test]
    fn test_label_amount_currency() {
        let caps = TOTAL_LABEL_AMOUNT_CURRENCY.captures("Total 34.65 CHF").unwrap();
        assert_eq!(&caps[1], "34.65");
    }

    #[test]
    fn test_standalone_lines() {
        let text = "Bon 42\nCHF 34.65\n12,00 EUR\nCHF 1.00 extra";
        let a: Vec<_> = LINE_CURRENCY_AMOUNT
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect();
        let b: Vec<_> = LINE_AMOUNT_CURRENCY
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect();
        assert_eq!(a, vec!["34.65"]);
        assert_eq!(b, vec!["12,00"]);
    }

    #[test]
    fn test_line_keyword_is_word_bounded() {
        assert!(LINE_TOTAL_KEYWORD.is_match("Total (inkl. MwSt)"));
        assert!(LINE_TOTAL_KEYWORD.is_match("summe"));
        assert!(!LINE_TOTAL_KEYWORD.is_match("Zwischensumme"));
        assert!(!LINE_TOTAL_KEYWORD.is_match("Totalbetrag"));
    }
}
