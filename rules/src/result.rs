//! Match outcome returned to the transport layer.

use serde::{Deserialize, Serialize};

use crate::entities::ExtractedEntities;

/// Outcome of processing one request.
///
/// Serializes as `{"status": "success" | "error", "entities": {...}, "message": ...}`,
/// with `message` present only on failures that carry one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum MatchResult {
    #[serde(rename = "success")]
    Success { entities: ExtractedEntities },

    #[serde(rename = "error")]
    Failure {
        entities: ExtractedEntities,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl MatchResult {
    pub fn failure(entities: ExtractedEntities, message: impl Into<String>) -> Self {
        MatchResult::Failure {
            entities,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MatchResult::Success { .. })
    }

    /// The `status` field value.
    pub fn status(&self) -> &'static str {
        match self {
            MatchResult::Success { .. } => "success",
            MatchResult::Failure { .. } => "error",
        }
    }

    /// Entities extracted from the request, on success and failure alike.
    pub fn entities(&self) -> &ExtractedEntities {
        match self {
            MatchResult::Success { entities } | MatchResult::Failure { entities, .. } => entities,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            MatchResult::Success { .. } => None,
            MatchResult::Failure { message, .. } => message.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_json() {
        let result = MatchResult::Success {
            entities: ExtractedEntities {
                ip_addresses: vec!["10.0.0.1".to_string()],
                ..Default::default()
            },
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "status": "success",
                "entities": {
                    "IP": ["10.0.0.1"],
                    "SourceZone": null,
                    "DestinationZone": null,
                    "Service": null,
                },
            })
        );
        assert_eq!(result.status(), "success");
        assert_eq!(result.message(), None);
    }

    #[test]
    fn test_failure_json() {
        let result = MatchResult::failure(ExtractedEntities::default(), "nothing");
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["status"], "error");
        assert_eq!(value["message"], "nothing");
        assert_eq!(value["entities"]["IP"], json!([]));

        let without_message = MatchResult::Failure {
            entities: ExtractedEntities::default(),
            message: None,
        };
        let value = serde_json::to_value(&without_message).unwrap();
        assert!(value.get("message").is_none());
    }

    #[test]
    fn test_parse_failure() {
        let result: MatchResult =
            serde_json::from_str(r#"{"status": "error", "entities": {"IP": ["1.2.3.4"]}}"#)
                .unwrap();
        assert!(!result.is_success());
        assert_eq!(result.entities().ip_addresses, ["1.2.3.4"]);
        assert_eq!(result.message(), None);
    }
}
