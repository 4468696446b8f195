//! Document Analyzer
//!
//! Reads an onboarding document and produces an analysis payload.

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::User;
use crate::error::ToolError;
use crate::flags::GENAI_ANALYSIS;
use crate::tools::{status_error, ToolExecutor, ToolInfo, DOCUMENT_ANALYZER};

/// Accepted values of `extraction_mode`
pub const EXTRACTION_MODES: &[&str] = &["wealth_management", "kyc", "risk_assessment", "general"];

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug, Default)]
pub struct DocumentAnalyzer;

impl DocumentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Pulls text out of the document. Image OCR is not wired up.
    async fn extract_text(&self, path: &str) -> Result<String, ToolError> {
        let is_image = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.iter().any(|i| ext.eq_ignore_ascii_case(i)))
            .unwrap_or(false);

        if is_image {
            return Ok("Text extraction for this format not implemented yet".to_string());
        }

        let bytes = tokio::fs::read(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn analyze(&self, text: &str, mode: &str) -> Value {
        json!({
            "status": "success",
            "analysis": "Analysis results based on the text",
            "extraction_mode": mode,
            "characters": text.chars().count(),
            "words": text.split_whitespace().count(),
        })
    }
}

#[async_trait]
impl ToolExecutor for DocumentAnalyzer {
    fn info(&self) -> ToolInfo {
        ToolInfo {
            name: DOCUMENT_ANALYZER.to_string(),
            description: "Analyze financial documents for onboarding compliance and risk assessment"
                .to_string(),
            parameters: json!({
                "document_path": {
                    "type": "string",
                    "description": "Path to the document to analyze",
                    "required": true
                },
                "extraction_mode": {
                    "type": "string",
                    "description": "Mode for document analysis",
                    "enum": EXTRACTION_MODES,
                    "required": false,
                    "default": "general"
                }
            }),
            gate: Some(GENAI_ANALYSIS),
        }
    }

    async fn execute(&self, arguments: &Value, user: &User) -> Result<Value, ToolError> {
        let path = arguments
            .get("document_path")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("document_path is required".to_string()))?;

        let mode = arguments
            .get("extraction_mode")
            .and_then(Value::as_str)
            .unwrap_or("general");
        if !EXTRACTION_MODES.contains(&mode) {
            return Ok(status_error(format!("Unknown extraction mode: {}", mode)));
        }

        match tokio::fs::metadata(path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(status_error(format!("Document not found: {}", path)));
            }
            Err(e) => return Err(e.into()),
        }

        let text = self.extract_text(path).await?;
        let analysis = self.analyze(&text, mode);

        info!(path = %path, user = %user.id, mode = %mode, "document analysis completed");
        Ok(analysis)
    }
}
