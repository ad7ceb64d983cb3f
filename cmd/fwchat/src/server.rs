//! HTTP transport for the chatbot.
//!
//! API endpoints:
//! - POST /chat   - {"prompt": "..."} -> MatchResult JSON
//! - GET  /health - {"status": "ok", "rules": N}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use fwchat_rules::Chatbot;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const NO_PROMPT: &str = "No prompt provided";

pub fn router(bot: Arc<Chatbot>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .with_state(bot)
        .layer(TraceLayer::new_for_http())
}

/// Serve the chatbot on `addr` until the process exits.
pub async fn serve(addr: &str, bot: Arc<Chatbot>) -> Result<()> {
    let addr = parse_addr(addr)?;
    let app = router(bot);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Parse address string to SocketAddr.
pub fn parse_addr(addr: &str) -> Result<SocketAddr> {
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };
    Ok(addr.parse()?)
}

fn error_body(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

async fn chat(
    State(bot): State<Arc<Chatbot>>,
    body: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "rejected chat request body");
            return error_body(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let Some(prompt) = body.get("prompt").and_then(Value::as_str) else {
        warn!("chat request without prompt");
        return error_body(StatusCode::BAD_REQUEST, NO_PROMPT);
    };

    let result = bot.process(prompt);
    match serde_json::to_value(&result) {
        Ok(value) => (StatusCode::OK, Json(value)),
        Err(e) => {
            error!(error = %e, "serialize match result");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn health(State(bot): State<Arc<Chatbot>>) -> Json<Value> {
    Json(json!({ "status": "ok", "rules": bot.table().len() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwchat_rules::{MatchOptions, RuleEntities, RuleRecord, RuleTable};

    fn bot() -> Arc<Chatbot> {
        let table = RuleTable::new(vec![RuleRecord {
            prompt: "web".to_string(),
            entities: RuleEntities {
                ip_addresses: ["10.0.0.5".to_string(), "10.0.0.1".to_string()].into(),
                ..Default::default()
            },
            response: "allow web".to_string(),
        }]);
        Arc::new(Chatbot::new(table, MatchOptions::default()).unwrap())
    }

    async fn post_chat(body: Value) -> (StatusCode, Value) {
        let (status, Json(value)) = chat(State(bot()), Ok(Json(body))).await;
        (status, value)
    }

    #[tokio::test]
    async fn test_chat_success() {
        let (status, body) = post_chat(json!({
            "prompt": r#"Allow access for IP "10.0.0.5" from "10.0.0.1" source and "LAN" zone to "DMZ" zone with Service "HTTP""#
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "success",
                "entities": {
                    "IP": ["10.0.0.5", "10.0.0.1"],
                    "SourceZone": "LAN",
                    "DestinationZone": "DMZ",
                    "Service": "HTTP",
                },
            })
        );
    }

    #[tokio::test]
    async fn test_chat_no_match() {
        let (status, body) = post_chat(json!({"prompt": "open 8.8.8.8"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert_eq!(body["entities"]["IP"], json!(["8.8.8.8"]));
    }

    #[tokio::test]
    async fn test_chat_missing_prompt() {
        for body in [
            json!({}),
            json!({"prompt": 42}),
            json!({"prompt": null}),
            json!({"text": "hello"}),
        ] {
            let (status, value) = post_chat(body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(value, json!({"error": "No prompt provided"}));
        }
    }

    #[tokio::test]
    async fn test_chat_empty_prompt_is_processed() {
        let (status, body) = post_chat(json!({"prompt": ""})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "error",
                "entities": {
                    "IP": [],
                    "SourceZone": null,
                    "DestinationZone": null,
                    "Service": null,
                },
                "message": "no entities found in request",
            })
        );
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health(State(bot())).await;
        assert_eq!(body, json!({"status": "ok", "rules": 1}));
    }

    #[test]
    fn test_parse_addr() {
        assert_eq!(
            parse_addr(":5000").unwrap(),
            "0.0.0.0:5000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(parse_addr("127.0.0.1:8080").unwrap().port(), 8080);
        assert!(parse_addr("localhost").is_err());
    }
}
