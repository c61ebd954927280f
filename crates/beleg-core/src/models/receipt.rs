//! Receipt fact models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A recognized merchant chain.
///
/// Name and chain identifier always come from the same table entry, so they
/// are carried together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    /// Canonical display name.
    pub merchant_name: String,

    /// Chain identifier.
    pub chain_id: String,
}

/// Structured facts derived from receipt text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptFacts {
    /// Recognized merchant, if any.
    #[serde(flatten)]
    pub merchant: Option<Merchant>,

    /// Total amount, if one could be located. Serialized as a JSON number.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total: Option<Decimal>,
}

impl ReceiptFacts {
    /// Display name of the merchant.
    pub fn merchant_name(&self) -> Option<&str> {
        self.merchant.as_ref().map(|m| m.merchant_name.as_str())
    }

    /// Chain identifier of the merchant.
    pub fn chain_id(&self) -> Option<&str> {
        self.merchant.as_ref().map(|m| m.chain_id.as_str())
    }

    /// Whether nothing at all was recognized.
    pub fn is_empty(&self) -> bool {
        self.merchant.is_none() && self.total.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_flat_serialization() {
        let facts = ReceiptFacts {
            merchant: Some(Merchant {
                merchant_name: "Coop".to_string(),
                chain_id: "Coop".to_string(),
            }),
            total: Some(Decimal::from_str("34.65").unwrap()),
        };

        let json = serde_json::to_value(&facts).unwrap();
        assert_eq!(json["merchant_name"], "Coop");
        assert_eq!(json["chain_id"], "Coop");
        assert!((json["total"].as_f64().unwrap() - 34.65).abs() < 1e-9);
    }

    #[test]
    fn test_missing_total_is_null() {
        let json = serde_json::to_value(ReceiptFacts::default()).unwrap();
        assert!(json["total"].is_null());
        assert!(json.get("merchant_name").is_none());
    }

    #[test]
    fn test_accessors_on_empty() {
        let facts = ReceiptFacts::default();
        assert!(facts.is_empty());
        assert_eq!(facts.merchant_name(), None);
        assert_eq!(facts.chain_id(), None);
    }
}
