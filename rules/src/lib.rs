//! Firewall rule matching from free-text change requests.
//!
//! A request such as
//! `Allow access for IP "10.0.0.5" from "10.0.0.1" source and "LAN" zone to "DMZ" zone with Service "HTTP"`
//! is run through two stages:
//!
//! 1. [`Extractor`] pulls typed entities (addresses, zones, service) out of
//!    the text with one named pattern per entity kind.
//! 2. [`Matcher`] filters a read-only [`RuleTable`] with an explicit list of
//!    [`Predicate`]s and reports the outcome as a [`MatchResult`].
//!
//! [`Chatbot`] ties both stages together and is the object a transport layer
//! holds on to.
//!
//! # Example
//!
//! ```rust
//! use fwchat_rules::{Chatbot, MatchOptions, RuleRecord, RuleEntities, RuleTable};
//!
//! let table = RuleTable::new(vec![RuleRecord {
//!     prompt: "allow web".to_string(),
//!     entities: RuleEntities {
//!         ip_addresses: ["10.0.0.1".to_string()].into(),
//!         ..Default::default()
//!     },
//!     response: "ok".to_string(),
//! }]);
//!
//! let bot = Chatbot::new(table, MatchOptions::default()).unwrap();
//! let result = bot.process(r#"Allow access from "10.0.0.1" to "DMZ" zone"#);
//! assert!(result.is_success());
//! ```

mod chatbot;
mod entities;
mod error;
mod extract;
mod labeler;
mod matcher;
mod result;
mod table;

pub use chatbot::{Chatbot, MatchOptions};
pub use entities::{EntityKind, ExtractedEntities, RuleEntities};
pub use error::RulesError;
pub use extract::{
    DEFAULT_ADDRESS_PATTERN, DEFAULT_DESTINATION_ZONE_PATTERN, DEFAULT_SERVICE_PATTERN,
    DEFAULT_SOURCE_ZONE_PATTERN, ExtractionRule, Extractor, Patterns,
};
pub use labeler::{EntityLabeler, LabeledSpan};
pub use matcher::{DEFAULT_PREDICATES, Matcher, NO_ENTITIES_MESSAGE, NO_MATCH_MESSAGE, Predicate};
pub use result::MatchResult;
pub use table::{RuleRecord, RuleTable};
