//! Entity records shared by the extractor, the rule table and match results.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The entity kinds recognised in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "IP")]
    Ip,
    SourceZone,
    DestinationZone,
    Service,
}

impl EntityKind {
    /// All kinds, in extraction order.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Ip,
        EntityKind::SourceZone,
        EntityKind::DestinationZone,
        EntityKind::Service,
    ];

    /// Key used for this kind in serialized entity objects.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Ip => "IP",
            EntityKind::SourceZone => "SourceZone",
            EntityKind::DestinationZone => "DestinationZone",
            EntityKind::Service => "Service",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entities extracted from a single request.
///
/// Serialized with the same keys as the rule table's entities objects.
/// Absent fields serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    /// Every dotted-quad address in order of appearance, duplicates kept.
    #[serde(rename = "IP", default)]
    pub ip_addresses: Vec<String>,

    #[serde(rename = "SourceZone", default)]
    pub source_zone: Option<String>,

    #[serde(rename = "DestinationZone", default)]
    pub destination_zone: Option<String>,

    #[serde(rename = "Service", default)]
    pub service: Option<String>,
}

impl ExtractedEntities {
    /// True when nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.ip_addresses.is_empty()
            && self.source_zone.is_none()
            && self.destination_zone.is_none()
            && self.service.is_none()
    }

    /// Value of a single-valued entity. Always `None` for [`EntityKind::Ip`].
    pub fn get(&self, kind: EntityKind) -> Option<&str> {
        match kind {
            EntityKind::Ip => None,
            EntityKind::SourceZone => self.source_zone.as_deref(),
            EntityKind::DestinationZone => self.destination_zone.as_deref(),
            EntityKind::Service => self.service.as_deref(),
        }
    }
}

/// Entities recorded for one rule of the table.
///
/// Same shape as [`ExtractedEntities`], except that the addresses form a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntities {
    #[serde(rename = "IP", default)]
    pub ip_addresses: BTreeSet<String>,

    #[serde(rename = "SourceZone", default)]
    pub source_zone: Option<String>,

    #[serde(rename = "DestinationZone", default)]
    pub destination_zone: Option<String>,

    #[serde(rename = "Service", default)]
    pub service: Option<String>,
}

impl RuleEntities {
    pub fn contains_address(&self, address: &str) -> bool {
        self.ip_addresses.contains(address)
    }

    /// Value of a single-valued entity. Always `None` for [`EntityKind::Ip`].
    pub fn get(&self, kind: EntityKind) -> Option<&str> {
        match kind {
            EntityKind::Ip => None,
            EntityKind::SourceZone => self.source_zone.as_deref(),
            EntityKind::DestinationZone => self.destination_zone.as_deref(),
            EntityKind::Service => self.service.as_deref(),
        }
    }
}
