//! Input Validation Module
//!
//! Shape and size checks run before any tool sees a request.

use std::path::Path;

use serde_json::Value;

use crate::error::AppError;

// == Public Constants ==
/// Largest document accepted for analysis (10 MiB)
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Document extensions the analyzer accepts
pub const ALLOWED_DOCUMENT_TYPES: &[&str] = &["pdf", "jpg", "jpeg", "png"];

// == Input Validator ==
/// Validates tool request bodies.
#[derive(Debug, Clone)]
pub struct InputValidator {
    max_document_bytes: u64,
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DOCUMENT_BYTES)
    }
}

fn require(request: &Value, field: &str, message: &str) -> Result<(), AppError> {
    match request.get(field) {
        Some(value) if !value.is_null() => Ok(()),
        _ => Err(AppError::InvalidRequest(message.to_string())),
    }
}

impl InputValidator {
    pub fn new(max_document_bytes: u64) -> Self {
        Self { max_document_bytes }
    }

    // == Validate File ==
    /// Checks the document's extension, existence and size.
    pub async fn validate_file(&self, path: &str) -> Result<(), AppError> {
        let allowed = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                ALLOWED_DOCUMENT_TYPES
                    .iter()
                    .any(|allowed| ext.eq_ignore_ascii_case(allowed))
            })
            .unwrap_or(false);

        if !allowed {
            return Err(AppError::InvalidRequest("Invalid file type".to_string()));
        }

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| AppError::InvalidRequest(format!("Document not found: {}", path)))?;

        if metadata.len() > self.max_document_bytes {
            return Err(AppError::InvalidRequest("File too large".to_string()));
        }

        Ok(())
    }

    // == Document Analysis ==
    pub async fn validate_document_analysis_request(&self, request: &Value) -> Result<(), AppError> {
        let path = request
            .get("document_path")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::InvalidRequest("Document path is required".to_string()))?;

        self.validate_file(path).await
    }

    // == Compliance ==
    pub fn validate_compliance_request(&self, request: &Value) -> Result<(), AppError> {
        require(request, "client_data", "Client data is required")?;
        require(request, "jurisdictions", "Jurisdictions are required")
    }

    // == Risk Prediction ==
    pub fn validate_risk_prediction_request(&self, request: &Value) -> Result<(), AppError> {
        require(request, "client_profile", "Client profile is required")
    }

    // == Chat ==
    pub fn validate_chat_request(&self, request: &Value) -> Result<(), AppError> {
        require(request, "message", "Message is required")?;
        require(request, "client_id", "Client ID is required")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn document(suffix: &str, bytes: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(&vec![b'a'; bytes]).unwrap();
        file
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::InvalidRequest(msg) => msg,
            other => panic!("expected invalid request, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_document_accepted() {
        let file = document(".PDF", 128);
        let request = json!({ "document_path": file.path().to_str().unwrap() });

        let result = InputValidator::default()
            .validate_document_analysis_request(&request)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_document_path_required() {
        let err = InputValidator::default()
            .validate_document_analysis_request(&json!({}))
            .await
            .unwrap_err();
        assert_eq!(message(err), "Document path is required");
    }

    #[tokio::test]
    async fn test_document_wrong_type() {
        let file = document(".txt", 16);
        let err = InputValidator::default()
            .validate_file(file.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert_eq!(message(err), "Invalid file type");
    }

    #[tokio::test]
    async fn test_document_too_large() {
        let file = document(".png", 2048);
        let err = InputValidator::new(1024)
            .validate_file(file.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert_eq!(message(err), "File too large");
    }

    #[tokio::test]
    async fn test_document_missing() {
        let err = InputValidator::default()
            .validate_file("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(message(err).starts_with("Document not found"));
    }

    #[test]
    fn test_compliance_fields() {
        let validator = InputValidator::default();

        assert!(validator
            .validate_compliance_request(&json!({"client_data": {}, "jurisdictions": ["MAS"]}))
            .is_ok());
        assert_eq!(
            message(
                validator
                    .validate_compliance_request(&json!({"jurisdictions": ["MAS"]}))
                    .unwrap_err()
            ),
            "Client data is required"
        );
        assert_eq!(
            message(
                validator
                    .validate_compliance_request(&json!({"client_data": {}}))
                    .unwrap_err()
            ),
            "Jurisdictions are required"
        );
    }

    #[test]
    fn test_risk_and_chat_fields() {
        let validator = InputValidator::default();

        assert!(validator
            .validate_risk_prediction_request(&json!({"client_profile": {"age": 40}}))
            .is_ok());
        assert!(validator
            .validate_risk_prediction_request(&json!({"client_profile": null}))
            .is_err());

        assert!(validator
            .validate_chat_request(&json!({"message": "hi", "client_id": "c-1"}))
            .is_ok());
        assert!(validator
            .validate_chat_request(&json!({"message": "hi"}))
            .is_err());
    }
}
