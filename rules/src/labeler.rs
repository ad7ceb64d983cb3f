//! Extension point for a token-classification model.
//!
//! Matching never consults a labeler. A [`Chatbot`](crate::Chatbot) only
//! carries one so its labels can be inspected next to the pattern-based
//! extraction.

use serde::{Deserialize, Serialize};

use crate::error::RulesError;

/// A labeled run of text. Offsets are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSpan {
    pub label: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub score: f32,
}

/// Given text, return entity labels for it.
pub trait EntityLabeler: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    fn label(&self, text: &str) -> Result<Vec<LabeledSpan>, RulesError>;
}
