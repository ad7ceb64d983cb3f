//! The request-handling context: extractor, matcher and optional labeler.

use tracing::{debug, info};

use crate::entities::ExtractedEntities;
use crate::error::RulesError;
use crate::extract::{Extractor, Patterns};
use crate::labeler::{EntityLabeler, LabeledSpan};
use crate::matcher::{DEFAULT_PREDICATES, Matcher, Predicate};
use crate::result::MatchResult;
use crate::table::RuleTable;

/// Options for building a [`Chatbot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOptions {
    /// Extraction patterns.
    pub patterns: Patterns,

    /// Active matcher predicates, applied in order.
    pub predicates: Vec<Predicate>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            patterns: Patterns::default(),
            predicates: DEFAULT_PREDICATES.to_vec(),
        }
    }
}

impl MatchOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patterns(mut self, patterns: Patterns) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_predicates(mut self, predicates: impl Into<Vec<Predicate>>) -> Self {
        self.predicates = predicates.into();
        self
    }
}

/// Built once at startup and shared (e.g. behind an `Arc`) by every request.
///
/// Holds no mutable state; concurrent calls to [`process`](Self::process)
/// need no locking.
pub struct Chatbot {
    extractor: Extractor,
    matcher: Matcher,
    labeler: Option<Box<dyn EntityLabeler>>,
}

impl Chatbot {
    /// Compile the extraction patterns and take ownership of the table.
    pub fn new(table: RuleTable, opts: MatchOptions) -> Result<Self, RulesError> {
        let extractor = Extractor::compile(&opts.patterns)?;
        let matcher = Matcher::new(table, &opts.predicates);
        info!(
            rules = matcher.table().len(),
            predicates = ?matcher.predicates(),
            "chatbot ready"
        );
        Ok(Self {
            extractor,
            matcher,
            labeler: None,
        })
    }

    /// Attach a token-classification model for diagnostics.
    pub fn with_labeler(mut self, labeler: Box<dyn EntityLabeler>) -> Self {
        info!(labeler = labeler.name(), "attached entity labeler");
        self.labeler = Some(labeler);
        self
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn table(&self) -> &RuleTable {
        self.matcher.table()
    }

    pub fn has_labeler(&self) -> bool {
        self.labeler.is_some()
    }

    pub fn extract(&self, text: &str) -> ExtractedEntities {
        self.extractor.extract(text)
    }

    /// Extract entities from `text` and match them against the rule table.
    pub fn process(&self, text: &str) -> MatchResult {
        info!(prompt = text, "received prompt");
        let entities = self.extractor.extract(text);
        debug!(?entities, "extracted entities");
        self.matcher.match_entities(entities)
    }

    /// Run the attached labeler, if any.
    pub fn label(&self, text: &str) -> Option<Result<Vec<LabeledSpan>, RulesError>> {
        self.labeler.as_ref().map(|l| l.label(text))
    }
}
