//! Fact parsing for receipt text.

mod parser;
pub mod rules;

pub use parser::{parse, ParseOutcome, ReceiptParser};
