//! Answer and citation types.

use serde::{Deserialize, Serialize};

/// One entry of the source list returned with an answer.
///
/// The marker matches the rank of the passage in the prompt context, so
/// `[1]` in the answer text refers to the first citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    /// Bracketed rank, e.g. "[1]"
    pub marker: String,

    /// Original upload name
    pub file_name: String,

    /// Start of the passage, at most 180 characters plus an ellipsis
    pub preview: String,

    /// Similarity rounded to three decimals
    pub score: f32,
}

/// Model answer with the citations built from the supplied passages.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<Citation>,
}
