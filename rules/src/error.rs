//! Error types for rule loading and chatbot construction.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for rule table loading and matcher setup.
///
/// Every variant is an initialization failure. A request that matches no
/// rule is not an error; it comes back as [`MatchResult::Failure`](crate::MatchResult).
#[derive(Debug, Error)]
pub enum RulesError {
    /// The rule table file does not exist.
    #[error("rule table not found at {0}")]
    NotFound(PathBuf),

    /// The rule table file extension is not csv, json, yaml or yml.
    #[error("unsupported rule table format: {0:?}")]
    UnsupportedFormat(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A CSV row whose `Entities` cell is not a valid entities object.
    #[error("row {row}: invalid entities column: {source}")]
    InvalidEntities {
        row: usize,
        #[source]
        source: serde_json::Error,
    },

    /// An extraction pattern failed to compile.
    #[error("invalid {name} pattern: {source}")]
    Pattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },

    /// The token-classification model failed.
    #[error("model error: {0}")]
    Model(String),
}
