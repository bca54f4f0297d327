//! Grounded answering over retrieved passages.

pub mod synthesizer;
pub mod types;

pub use synthesizer::{build_citations, AnswerSynthesizer};
pub use types::{Answer, Citation};
