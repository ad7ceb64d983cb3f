//! Turning per-token classifier output into labeled spans.

use std::collections::BTreeMap;

use anyhow::Context;
use fwchat_rules::LabeledSpan;
use serde::Deserialize;

/// Class id to label name, as found in a model's `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    labels: BTreeMap<usize, String>,
}

#[derive(Deserialize)]
struct ModelConfig {
    id2label: BTreeMap<String, String>,
}

impl LabelMap {
    pub fn new(labels: impl IntoIterator<Item = (usize, String)>) -> Self {
        Self {
            labels: labels.into_iter().collect(),
        }
    }

    /// Parse the `id2label` table of a Hugging Face model config.
    ///
    /// Keys are JSON strings holding class ids (`{"0": "O", "1": "B-PER"}`).
    pub fn from_config_json(data: &[u8]) -> anyhow::Result<Self> {
        let config: ModelConfig = serde_json::from_slice(data).context("parse model config")?;
        let mut labels = BTreeMap::new();
        for (id, label) in config.id2label {
            let id: usize = id
                .parse()
                .with_context(|| format!("invalid class id {id:?} in id2label"))?;
            labels.insert(id, label);
        }
        anyhow::ensure!(!labels.is_empty(), "id2label is empty");
        Ok(Self { labels })
    }

    pub fn get(&self, id: usize) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Classifier output for one (non-special) token.
///
/// `start` and `end` are byte offsets into the input text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenPrediction {
    pub label: usize,
    pub score: f32,
    pub start: usize,
    pub end: usize,
}

/// Index and probability of the most likely class in `logits`.
pub fn softmax_argmax(logits: &[f32]) -> (usize, f32) {
    let Some((best, &max)) = logits
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
    else {
        return (0, 0.0);
    };
    let sum: f32 = logits.iter().map(|x| (x - max).exp()).sum();
    (best, 1.0 / sum)
}

struct Open {
    entity: String,
    start: usize,
    end: usize,
    scores: Vec<f32>,
}

impl Open {
    fn close(self, text: &str) -> LabeledSpan {
        let score = self.scores.iter().sum::<f32>() / self.scores.len() as f32;
        LabeledSpan {
            text: text.get(self.start..self.end).unwrap_or_default().to_string(),
            label: self.entity,
            start: self.start,
            end: self.end,
            score,
        }
    }
}

/// Split `B-PER` into (`true`, `PER`). Unprefixed labels continue like `I-`.
fn split_tag(label: &str) -> (bool, &str) {
    if let Some(entity) = label.strip_prefix("B-") {
        (true, entity)
    } else if let Some(entity) = label.strip_prefix("I-") {
        (false, entity)
    } else {
        (false, label)
    }
}

/// Merge token predictions into entity spans.
///
/// Accepts both IOB1 and IOB2 tagging: `B-X` always opens a span, `I-X`
/// extends an open `X` span or opens one. `O` and ids missing from
/// `labels` close the open span.
pub fn aggregate(text: &str, tokens: &[TokenPrediction], labels: &LabelMap) -> Vec<LabeledSpan> {
    let mut spans = Vec::new();
    let mut open: Option<Open> = None;

    for token in tokens {
        let label = match labels.get(token.label) {
            Some(l) if l != "O" => l,
            _ => {
                if let Some(o) = open.take() {
                    spans.push(o.close(text));
                }
                continue;
            }
        };

        let (begin, entity) = split_tag(label);
        if let Some(o) = open.as_mut() {
            if !begin && o.entity == entity {
                o.end = token.end;
                o.scores.push(token.score);
                continue;
            }
        }
        if let Some(o) = open.take() {
            spans.push(o.close(text));
        }
        open = Some(Open {
            entity: entity.to_string(),
            start: token.start,
            end: token.end,
            scores: vec![token.score],
        });
    }

    if let Some(o) = open {
        spans.push(o.close(text));
    }
    spans
}
