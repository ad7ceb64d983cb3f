//! Rule matching over the extracted entities.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::{EntityKind, ExtractedEntities, RuleEntities};
use crate::result::MatchResult;
use crate::table::{RuleRecord, RuleTable};

/// Predicates applied when none are configured: address membership only.
pub const DEFAULT_PREDICATES: &[Predicate] = &[Predicate::Ip];

/// Failure message when no rule survives the predicates.
pub const NO_MATCH_MESSAGE: &str = "no rule matches the extracted entities";

/// Failure message when nothing was extracted from the request.
pub const NO_ENTITIES_MESSAGE: &str = "no entities found in request";

/// A narrowing step applied to the candidate rules.
///
/// A predicate whose entity was not extracted keeps every candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Keep rules whose address set contains ANY extracted address.
    Ip,
    /// Keep rules with an equal source zone.
    SourceZone,
    /// Keep rules with an equal destination zone.
    DestinationZone,
    /// Keep rules with an equal service.
    Service,
}

impl Predicate {
    pub fn kind(&self) -> EntityKind {
        match self {
            Predicate::Ip => EntityKind::Ip,
            Predicate::SourceZone => EntityKind::SourceZone,
            Predicate::DestinationZone => EntityKind::DestinationZone,
            Predicate::Service => EntityKind::Service,
        }
    }

    /// Whether `rule` survives this predicate for `entities`.
    pub fn retains(&self, entities: &ExtractedEntities, rule: &RuleEntities) -> bool {
        match self {
            Predicate::Ip => {
                entities.ip_addresses.is_empty()
                    || entities
                        .ip_addresses
                        .iter()
                        .any(|ip| rule.contains_address(ip))
            }
            _ => match entities.get(self.kind()) {
                None => true,
                Some(value) => rule.get(self.kind()) == Some(value),
            },
        }
    }
}

/// Filters a [`RuleTable`] with an ordered list of [`Predicate`]s.
#[derive(Debug, Clone)]
pub struct Matcher {
    table: RuleTable,
    predicates: Vec<Predicate>,
}

impl Matcher {
    /// Build a matcher over `table`. Repeated predicates are dropped.
    pub fn new(table: RuleTable, predicates: &[Predicate]) -> Self {
        let mut unique: Vec<Predicate> = Vec::with_capacity(predicates.len());
        for p in predicates {
            if !unique.contains(p) {
                unique.push(*p);
            }
        }
        Self {
            table,
            predicates: unique,
        }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// The first rule, in table order, retained by every predicate.
    ///
    /// Returns the rule's index alongside it.
    pub fn find(&self, entities: &ExtractedEntities) -> Option<(usize, &RuleRecord)> {
        self.table.iter().enumerate().find(|(_, rule)| {
            self.predicates
                .iter()
                .all(|p| p.retains(entities, &rule.entities))
        })
    }

    /// Match `entities` and wrap the outcome.
    ///
    /// Success carries the extracted entities, not the rule's response.
    pub fn match_entities(&self, entities: ExtractedEntities) -> MatchResult {
        if entities.is_empty() {
            debug!("nothing extracted, skipping rule table");
            return MatchResult::failure(entities, NO_ENTITIES_MESSAGE);
        }

        match self.find(&entities) {
            Some((index, rule)) => {
                debug!(index, prompt = %rule.prompt, "matched rule");
                MatchResult::Success { entities }
            }
            None => {
                debug!(candidates = self.table.len(), "no rule matched");
                MatchResult::failure(entities, NO_MATCH_MESSAGE)
            }
        }
    }
}
