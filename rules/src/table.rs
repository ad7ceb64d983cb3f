//! The rule table: annotated example rules loaded once at startup.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::RuleEntities;
use crate::error::RulesError;

/// One row of the rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    /// Canonical natural-language description of the rule.
    #[serde(alias = "Prompt")]
    pub prompt: String,

    /// Entities the rule concerns.
    #[serde(alias = "Entities", default)]
    pub entities: RuleEntities,

    /// Template returned for this rule.
    #[serde(alias = "Response", default)]
    pub response: String,
}

/// CSV layout: the entities column holds a JSON-encoded object.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Prompt")]
    prompt: String,
    #[serde(alias = "Entities", default)]
    entities: String,
    #[serde(alias = "Response", default)]
    response: String,
}

/// Header written by [`RuleTable::write_csv`].
const CSV_HEADER: [&str; 3] = ["Prompt", "Entities", "Response"];

/// Ordered, read-only sequence of [`RuleRecord`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<RuleRecord>,
}

impl RuleTable {
    pub fn new(rules: Vec<RuleRecord>) -> Self {
        Self { rules }
    }

    /// Load a table from disk, picking the format from the file extension
    /// (`csv`, `json`, `yaml` or `yml`).
    pub fn load(path: &Path) -> Result<Self, RulesError> {
        if !path.exists() {
            return Err(RulesError::NotFound(path.to_path_buf()));
        }

        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let table = match ext.as_str() {
            "csv" => Self::from_csv_reader(std::fs::File::open(path)?)?,
            "json" => Self::from_json(&std::fs::read(path)?)?,
            "yaml" | "yml" => Self::from_yaml(&std::fs::read(path)?)?,
            _ => return Err(RulesError::UnsupportedFormat(ext)),
        };

        info!(rules = table.len(), path = %path.display(), "loaded rule table");
        Ok(table)
    }

    /// Parse CSV with `Prompt`, `Entities` and optional `Response` columns.
    ///
    /// An empty `Entities` cell is read as an empty entities object.
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self, RulesError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut rules = Vec::new();

        for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = row?;
            let entities = if row.entities.trim().is_empty() {
                RuleEntities::default()
            } else {
                serde_json::from_str(&row.entities)
                    .map_err(|source| RulesError::InvalidEntities { row: i + 1, source })?
            };
            rules.push(RuleRecord {
                prompt: row.prompt,
                entities,
                response: row.response,
            });
        }

        Ok(Self { rules })
    }

    /// Parse a JSON array of records.
    pub fn from_json(data: &[u8]) -> Result<Self, RulesError> {
        Ok(Self {
            rules: serde_json::from_slice(data)?,
        })
    }

    /// Parse a YAML sequence of records.
    pub fn from_yaml(data: &[u8]) -> Result<Self, RulesError> {
        Ok(Self {
            rules: serde_yaml::from_slice(data)?,
        })
    }

    /// Write the table as CSV in the layout [`from_csv_reader`](Self::from_csv_reader) reads.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), RulesError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(CSV_HEADER)?;
        for rule in &self.rules {
            let entities = serde_json::to_string(&rule.entities)?;
            wtr.write_record([rule.prompt.as_str(), entities.as_str(), rule.response.as_str()])?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RuleRecord> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RuleRecord> {
        self.rules.iter()
    }

    pub fn rules(&self) -> &[RuleRecord] {
        &self.rules
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a RuleRecord;
    type IntoIter = std::slice::Iter<'a, RuleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl FromIterator<RuleRecord> for RuleTable {
    fn from_iter<I: IntoIterator<Item = RuleRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
