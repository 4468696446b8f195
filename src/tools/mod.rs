//! Tools Module
//!
//! Executors behind the `/mcp/tools/*` endpoints. Each tool is a thin call
//! into an external model; the model calls themselves are stubbed.

mod chat;
mod compliance;
mod document;
mod risk;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::auth::User;
use crate::error::ToolError;
use crate::flags::{CONVERSATIONAL_UI, GENAI_ANALYSIS};

pub use chat::ConversationalAssistant;
pub use compliance::{ComplianceValidator, Jurisdiction};
pub use document::DocumentAnalyzer;
pub use risk::{categorize_risk, RiskPanel, RiskPredictor};

// == Tool Names ==
pub const DOCUMENT_ANALYZER: &str = "document_analyzer";
pub const COMPLIANCE_VALIDATOR: &str = "compliance_validator";
pub const RISK_PREDICTOR: &str = "risk_predictor";
pub const CONVERSATIONAL_ASSISTANT: &str = "conversational_assistant";

// == Tool Info ==
/// Self-description returned by the tool listing.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    /// Parameter descriptions, keyed by parameter name
    pub parameters: Value,
    /// Feature flag that must be on for the caller, if any
    #[serde(skip)]
    pub gate: Option<&'static str>,
}

// == Tool Executor Trait ==
/// A callable analysis tool.
///
/// Problems with the caller's data come back as `{"status": "error", ...}`
/// payloads; `Err` is reserved for failures of the tool itself.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    fn info(&self) -> ToolInfo;

    async fn execute(&self, arguments: &Value, user: &User) -> Result<Value, ToolError>;
}

/// Builds the `{"status": "error"}` payload tools return for bad input.
pub(crate) fn status_error(message: impl Into<String>) -> Value {
    serde_json::json!({
        "status": "error",
        "message": message.into(),
    })
}

// == Tool Registry ==
/// Named tools in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<(String, Arc<dyn ToolExecutor>)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the four built-in tools.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DOCUMENT_ANALYZER, Arc::new(DocumentAnalyzer::new()));
        registry.register(COMPLIANCE_VALIDATOR, Arc::new(ComplianceValidator::new()));
        registry.register(RISK_PREDICTOR, Arc::new(RiskPredictor::new()));
        registry.register(
            CONVERSATIONAL_ASSISTANT,
            Arc::new(ConversationalAssistant::new()),
        );
        registry
    }

    /// Adds or replaces a tool.
    pub fn register(&mut self, name: &str, tool: Arc<dyn ToolExecutor>) {
        match self.tools.iter_mut().find(|(existing, _)| existing == name) {
            Some(slot) => slot.1 = tool,
            None => self.tools.push((name.to_string(), tool)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, tool)| tool.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ToolExecutor>)> {
        self.tools.iter().map(|(name, tool)| (name.as_str(), tool))
    }
}

/// Feature flag guarding each built-in tool.
pub(crate) fn default_gate(tool: &str) -> Option<&'static str> {
    match tool {
        DOCUMENT_ANALYZER => Some(GENAI_ANALYSIS),
        CONVERSATIONAL_ASSISTANT => Some(CONVERSATIONAL_UI),
        _ => None,
    }
}
