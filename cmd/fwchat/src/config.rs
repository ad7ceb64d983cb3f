//! Service configuration.
//!
//! Values come from an optional YAML or JSON file, then the environment
//! (`PORT`, `DEBUG`, `MODEL_PATH`, `RULES_PATH`), then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fwchat_rules::{DEFAULT_PREDICATES, MatchOptions, Patterns, Predicate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LISTEN: &str = ":5000";
pub const DEFAULT_RULES_PATH: &str = "data/raw/firewall_rules.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listen address; `:PORT` binds every interface.
    pub listen: String,

    /// Debug logging.
    pub debug: bool,

    /// Rule table file (csv, json or yaml).
    pub rules_path: PathBuf,

    /// Token-classification model directory. Not loaded when unset.
    pub model_path: Option<PathBuf>,

    /// Matcher predicates, applied in order.
    pub predicates: Vec<Predicate>,

    pub patterns: Patterns,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            debug: false,
            rules_path: PathBuf::from(DEFAULT_RULES_PATH),
            model_path: None,
            predicates: DEFAULT_PREDICATES.to_vec(),
            patterns: Patterns::default(),
        }
    }
}

impl Config {
    /// Read the config file, if any, and apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data =
            std::fs::read(path).with_context(|| format!("read config {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let cfg: Self = match ext.as_str() {
            "json" => serde_json::from_slice(&data)
                .with_context(|| format!("parse config {}", path.display()))?,
            "yaml" | "yml" => serde_yaml::from_slice(&data)
                .with_context(|| format!("parse config {}", path.display()))?,
            _ => anyhow::bail!("unsupported config format: {}", path.display()),
        };
        Ok(cfg)
    }

    /// Override fields from environment variables resolved by `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(port) = var("PORT") {
            self.listen = format!(":{port}");
        }
        if let Some(debug) = var("DEBUG") {
            self.debug = matches!(debug.as_str(), "True" | "true" | "1");
        }
        if let Some(path) = var("MODEL_PATH") {
            self.model_path = Some(PathBuf::from(path));
        }
        if let Some(path) = var("RULES_PATH") {
            self.rules_path = PathBuf::from(path);
        }
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions::new()
            .with_patterns(self.patterns.clone())
            .with_predicates(self.predicates.clone())
    }
}
