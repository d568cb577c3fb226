//! Narrative text clean-up and block classification

pub mod classify;
pub mod normalize;

pub use classify::{classify, classify_line, LayoutBlock, Rule, RULES};
pub use normalize::normalize;
