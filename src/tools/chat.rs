//! Conversational Assistant

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::User;
use crate::error::ToolError;
use crate::flags::CONVERSATIONAL_UI;
use crate::tools::{status_error, ToolExecutor, ToolInfo, CONVERSATIONAL_ASSISTANT};

#[derive(Debug, Default)]
pub struct ConversationalAssistant;

impl ConversationalAssistant {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolExecutor for ConversationalAssistant {
    fn info(&self) -> ToolInfo {
        ToolInfo {
            name: CONVERSATIONAL_ASSISTANT.to_string(),
            description: "Conversational assistant for onboarding".to_string(),
            parameters: json!({
                "message": {
                    "type": "string",
                    "description": "User message for conversational assistance",
                    "required": true
                },
                "client_id": {
                    "type": "string",
                    "description": "Client the conversation is about",
                    "required": true
                }
            }),
            gate: Some(CONVERSATIONAL_UI),
        }
    }

    async fn execute(&self, arguments: &Value, user: &User) -> Result<Value, ToolError> {
        // Older clients send `input_query` instead of `message`
        let query = arguments
            .get("message")
            .or_else(|| arguments.get("input_query"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim();

        if query.is_empty() {
            return Ok(status_error("No input query provided"));
        }

        info!(
            user = %user.id,
            chars = query.chars().count(),
            "conversational response generated"
        );
        Ok(json!({
            "status": "success",
            "client_id": arguments.get("client_id").cloned().unwrap_or(Value::Null),
            "response": "Sample conversational response",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn user() -> User {
        User {
            id: "user-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_chat_response() {
        let result = ConversationalAssistant::new()
            .execute(&json!({"message": "What documents do I need?", "client_id": "c-9"}), &user())
            .await
            .unwrap();

        assert_eq!(result["status"], "success");
        assert_eq!(result["client_id"], "c-9");
        assert!(result["response"].is_string());
    }

    #[tokio::test]
    async fn test_legacy_input_query() {
        let result = ConversationalAssistant::new()
            .execute(&json!({"input_query": "hello"}), &user())
            .await
            .unwrap();

        assert_eq!(result["status"], "success");
    }

    #[tokio::test]
    async fn test_blank_message() {
        let result = ConversationalAssistant::new()
            .execute(&json!({"message": "   ", "client_id": "c-9"}), &user())
            .await
            .unwrap();

        assert_eq!(result["status"], "error");
        assert_eq!(result["message"], "No input query provided");
    }

    /// Log sink shared with the test subscriber.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_logged_length_counts_characters() {
        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tokio_test::block_on(
                ConversationalAssistant::new()
                    .execute(&json!({"message": "Öffnungszeit"}), &user()),
            )
            .unwrap();
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        // 12 characters, 13 bytes in UTF-8
        assert!(logs.contains("chars=12"), "{}", logs);
        assert!(!logs.contains("chars=13"));
    }
}
