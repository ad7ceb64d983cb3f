//! Pattern-based entity extraction.
//!
//! Each entity kind is pulled out by its own [`ExtractionRule`], so tightening
//! or loosening one pattern never changes what the other rules see. The
//! extractor never fails: text without recognisable entities yields an empty
//! [`ExtractedEntities`].

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::entities::{EntityKind, ExtractedEntities};
use crate::error::RulesError;

/// Dotted-quad shape. Octets are not range checked, so `999.1.1.1` is accepted,
/// and `\d` is any Unicode decimal digit.
pub const DEFAULT_ADDRESS_PATTERN: &str = r"\b(?:\d{1,3}\.){3}\d{1,3}\b";

/// Quoted value after `from` or `source` (optionally `source and`).
pub const DEFAULT_SOURCE_ZONE_PATTERN: &str =
    r#"(?:[Ff]rom |[Ss]ource (?:and )?)['"](.*?)['"](?: zone)?"#;

/// Quoted value after `to`.
pub const DEFAULT_DESTINATION_ZONE_PATTERN: &str = r#"[Tt]o ['"](.*?)['"](?: zone)?"#;

/// Quoted value after `service` or `with service`.
pub const DEFAULT_SERVICE_PATTERN: &str = r#"(?:[Ss]ervice |with [Ss]ervice )['"](.*?)['"]"#;

/// Source patterns for the four extraction rules.
///
/// Quoted-value patterns yield their first capture group, or the whole match
/// when they have none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patterns {
    pub address: String,
    pub source_zone: String,
    pub destination_zone: String,
    pub service: String,
}

impl Default for Patterns {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS_PATTERN.to_string(),
            source_zone: DEFAULT_SOURCE_ZONE_PATTERN.to_string(),
            destination_zone: DEFAULT_DESTINATION_ZONE_PATTERN.to_string(),
            service: DEFAULT_SERVICE_PATTERN.to_string(),
        }
    }
}

/// A single named pattern producing values for one entity kind.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    kind: EntityKind,
    re: Regex,
    /// Values fully matching this pattern are skipped.
    reject: Option<Regex>,
}

impl ExtractionRule {
    /// Compile a rule for `kind` from `pattern`.
    pub fn new(kind: EntityKind, pattern: &str) -> Result<Self, RulesError> {
        let re = Regex::new(pattern).map_err(|source| RulesError::Pattern {
            name: rule_name(kind),
            source,
        })?;
        Ok(Self {
            kind,
            re,
            reject: None,
        })
    }

    /// Skip candidate values that are entirely matched by `reject`.
    pub fn rejecting(mut self, reject: Regex) -> Self {
        self.reject = Some(reject);
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        self.re.as_str()
    }

    /// All accepted values in order of appearance, duplicates kept.
    pub fn find_all(&self, text: &str) -> Vec<String> {
        self.re
            .captures_iter(text)
            .map(|caps| value(&caps))
            .filter(|v| !self.is_rejected(v))
            .map(str::to_string)
            .collect()
    }

    /// The first accepted value, if any.
    pub fn find_first(&self, text: &str) -> Option<String> {
        self.re
            .captures_iter(text)
            .map(|caps| value(&caps))
            .find(|v| !self.is_rejected(v))
            .map(str::to_string)
    }

    fn is_rejected(&self, value: &str) -> bool {
        self.reject.as_ref().is_some_and(|re| {
            re.find(value)
                .is_some_and(|m| m.start() == 0 && m.end() == value.len())
        })
    }
}

fn value<'t>(caps: &Captures<'t>) -> &'t str {
    match caps.get(1) {
        Some(m) => m.as_str(),
        None => caps.get(0).map_or("", |m| m.as_str()),
    }
}

fn rule_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Ip => "address",
        EntityKind::SourceZone => "source_zone",
        EntityKind::DestinationZone => "destination_zone",
        EntityKind::Service => "service",
    }
}

/// Extracts [`ExtractedEntities`] from request text.
#[derive(Debug, Clone)]
pub struct Extractor {
    address: ExtractionRule,
    source_zone: ExtractionRule,
    destination_zone: ExtractionRule,
    service: ExtractionRule,
}

impl Extractor {
    /// Compile an extractor from the given patterns.
    ///
    /// Zone rules skip quoted values that are themselves addresses, so
    /// `from "10.0.0.1" source and "LAN" zone` yields `LAN`.
    pub fn compile(patterns: &Patterns) -> Result<Self, RulesError> {
        let address = ExtractionRule::new(EntityKind::Ip, &patterns.address)?;
        let address_re = address.re.clone();

        Ok(Self {
            source_zone: ExtractionRule::new(EntityKind::SourceZone, &patterns.source_zone)?
                .rejecting(address_re.clone()),
            destination_zone: ExtractionRule::new(
                EntityKind::DestinationZone,
                &patterns.destination_zone,
            )?
            .rejecting(address_re),
            service: ExtractionRule::new(EntityKind::Service, &patterns.service)?,
            address,
        })
    }

    /// The rule used for `kind`.
    pub fn rule(&self, kind: EntityKind) -> &ExtractionRule {
        match kind {
            EntityKind::Ip => &self.address,
            EntityKind::SourceZone => &self.source_zone,
            EntityKind::DestinationZone => &self.destination_zone,
            EntityKind::Service => &self.service,
        }
    }

    /// Extract all entities from `text`. Never fails.
    pub fn extract(&self, text: &str) -> ExtractedEntities {
        ExtractedEntities {
            ip_addresses: self.address.find_all(text),
            source_zone: self.source_zone.find_first(text),
            destination_zone: self.destination_zone.find_first(text),
            service: self.service.find_first(text),
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::compile(&Patterns::default()).expect("default extraction patterns compile")
    }
}
