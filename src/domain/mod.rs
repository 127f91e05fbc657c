//! Domain layer types and invariants.

pub mod article;
pub mod error;
pub mod rich_text;
