//! ONNX Runtime token-classification model.
//!
//! The model directory must contain `model.onnx`, `tokenizer.json` and the
//! Hugging Face `config.json` carrying `id2label`. The exported graph takes
//! BERT-style `input_ids`, `attention_mask` and `token_type_ids` inputs and
//! yields logits shaped `[1, seq_len, num_labels]`.

use std::path::Path;

use fwchat_rules::{EntityLabeler, LabeledSpan, RulesError};
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::labels::{LabelMap, TokenPrediction, aggregate, softmax_argmax};

const MAX_TOKENS: usize = 512;

/// Named-entity labeler running a fine-tuned token classifier.
pub struct OnnxLabeler {
    name: String,
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: LabelMap,
}

impl OnnxLabeler {
    /// Load a model from a directory containing `model.onnx`,
    /// `tokenizer.json` and `config.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );
        anyhow::ensure!(config_path.exists(), "config.json not found in {model_dir:?}");

        let labels = LabelMap::from_config_json(&std::fs::read(&config_path)?)?;
        let session = Session::builder()?.commit_from_file(&model_path)?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;

        let name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        info!(name, labels = labels.len(), model = %model_path.display(), "loaded token classifier");
        Ok(Self {
            name,
            session: Mutex::new(session),
            tokenizer,
            labels,
        })
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Label the entities in `text`.
    pub fn predict(&self, text: &str) -> anyhow::Result<Vec<LabeledSpan>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let seq_len = encoding.get_ids().len();
        if seq_len == 0 {
            return Ok(vec![]);
        }

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let token_type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();

        let shape = [1i64, seq_len as i64];
        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.into_boxed_slice()))?;
        let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor,
        ])?;

        let (output_shape, logits) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] == 1 && dims[1] as usize == seq_len && dims[2] > 0,
            "unexpected output shape: {dims:?}, expected [1, {seq_len}, num_labels]"
        );
        let num_labels = dims[2] as usize;

        let special = encoding.get_special_tokens_mask();
        let offsets = encoding.get_offsets();
        let mut tokens = Vec::with_capacity(seq_len);
        for i in 0..seq_len {
            let (start, end) = offsets[i];
            if special[i] == 1 || start == end {
                continue;
            }
            let (label, score) = softmax_argmax(&logits[i * num_labels..(i + 1) * num_labels]);
            tokens.push(TokenPrediction {
                label,
                score,
                start,
                end,
            });
        }

        let spans = aggregate(text, &tokens, &self.labels);
        debug!(tokens = tokens.len(), spans = spans.len(), "labeled text");
        Ok(spans)
    }
}

impl EntityLabeler for OnnxLabeler {
    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self, text: &str) -> Result<Vec<LabeledSpan>, RulesError> {
        self.predict(text)
            .map_err(|e| RulesError::Model(format!("{e:#}")))
    }
}
