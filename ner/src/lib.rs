//! Named-entity labeling for firewall change requests.
//!
//! Label decoding is always available. The model itself runs on ONNX
//! Runtime and is only compiled with the `onnx` feature.

mod labels;
pub use labels::{LabelMap, TokenPrediction, aggregate, softmax_argmax};

#[cfg(feature = "onnx")]
mod model;
#[cfg(feature = "onnx")]
pub use model::OnnxLabeler;
