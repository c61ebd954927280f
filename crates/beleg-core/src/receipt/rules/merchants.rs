//! Merchant chain detection.

use tracing::debug;

use crate::models::receipt::Merchant;

/// A known merchant chain and the keyword that identifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MerchantEntry {
    /// Keyword searched for, case-insensitively, anywhere in the text.
    pub keyword: &'static str,
    /// Canonical display name.
    pub name: &'static str,
    /// Chain identifier.
    pub chain_id: &'static str,
}

impl MerchantEntry {
    pub fn to_merchant(&self) -> Merchant {
        Merchant {
            merchant_name: self.name.to_string(),
            chain_id: self.chain_id.to_string(),
        }
    }
}

/// Known chains in priority order. The first entry whose keyword occurs wins.
pub static MERCHANTS: [MerchantEntry; 4] = [
    MerchantEntry { keyword: "migros", name: "Migros", chain_id: "Migros" },
    MerchantEntry { keyword: "coop", name: "Coop", chain_id: "Coop" },
    MerchantEntry { keyword: "aldi", name: "Aldi", chain_id: "Aldi" },
    MerchantEntry { keyword: "lidl", name: "Lidl", chain_id: "Lidl" },
];

/// Find the first table entry whose keyword occurs in the text.
pub fn detect_merchant(text: &str) -> Option<&'static MerchantEntry> {
    let haystack = text.to_lowercase();
    let found = MERCHANTS.iter().find(|m| haystack.contains(m.keyword));
    if let Some(entry) = found {
        debug!("Detected merchant {}", entry.name);
    }
    found
}

/// Detect the merchant and return it as a fact.
pub fn extract_merchant(text: &str) -> Option<Merchant> {
    detect_merchant(text).map(MerchantEntry::to_merchant)
}
