//! Data models: configuration and receipt facts.

pub mod config;
pub mod receipt;
