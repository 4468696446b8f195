//! Risk Predictor
//!
//! Scores a client profile and, behind a flag, combines the score with a
//! compliance sweep across every jurisdiction.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::User;
use crate::error::ToolError;
use crate::tools::{
    status_error, ComplianceValidator, Jurisdiction, ToolExecutor, ToolInfo, RISK_PREDICTOR,
};

/// Score used when a profile carries no usable indicators
const NEUTRAL_SCORE: f64 = 0.5;

/// Buckets a score in [0, 1] into `low`, `medium` or `high`.
pub fn categorize_risk(score: f64) -> &'static str {
    if score < 0.3 {
        "low"
    } else if score < 0.7 {
        "medium"
    } else {
        "high"
    }
}

/// Numeric features pulled from `client_profile.risk_indicators`.
fn extract_features(profile: &Value) -> Vec<f64> {
    profile
        .get("risk_indicators")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default()
}

// == Risk Predictor ==
/// Untrained baseline model: mean of the indicators, neutral without any.
#[derive(Debug, Default)]
pub struct RiskPredictor;

impl RiskPredictor {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, profile: &Value) -> f64 {
        let features = extract_features(profile);
        if features.is_empty() {
            return NEUTRAL_SCORE;
        }
        let mean = features.iter().sum::<f64>() / features.len() as f64;
        mean.clamp(0.0, 1.0)
    }

    async fn insights(&self, _profile: &Value) -> String {
        "Insights based on GenAI analysis".to_string()
    }

    /// Scores `profile`, returning `None` when it is empty.
    async fn assess(&self, profile: &Value) -> Option<Value> {
        let empty = match profile {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            return None;
        }

        let score = self.score(profile);
        Some(json!({
            "status": "success",
            "risk_score": score,
            "risk_level": categorize_risk(score),
            "genai_insights": self.insights(profile).await,
        }))
    }
}

#[async_trait]
impl ToolExecutor for RiskPredictor {
    fn info(&self) -> ToolInfo {
        ToolInfo {
            name: RISK_PREDICTOR.to_string(),
            description: "Predict financial risk based on client data".to_string(),
            parameters: json!({
                "client_profile": {
                    "type": "object",
                    "description": "Client profile data for risk assessment",
                    "required": true
                }
            }),
            gate: None,
        }
    }

    async fn execute(&self, arguments: &Value, user: &User) -> Result<Value, ToolError> {
        let profile = arguments.get("client_profile").unwrap_or(&Value::Null);

        match self.assess(profile).await {
            Some(result) => {
                info!(user = %user.id, level = %result["risk_level"], "risk prediction completed");
                Ok(result)
            }
            None => Ok(status_error("No client profile data provided")),
        }
    }
}

// == Risk Panel ==
/// Runs the risk model and a full compliance sweep side by side.
#[derive(Debug, Default)]
pub struct RiskPanel {
    risk: RiskPredictor,
    compliance: ComplianceValidator,
}

impl RiskPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn analyze(&self, arguments: &Value, user: &User) -> Result<Value, ToolError> {
        let profile = arguments.get("client_profile").unwrap_or(&Value::Null);
        let codes: Vec<&str> = Jurisdiction::ALL.iter().map(Jurisdiction::code).collect();

        let (risk, compliance) = tokio::join!(self.risk.assess(profile), async {
            self.compliance.validate(&codes, profile)
        });

        let Some(mut risk) = risk else {
            return Ok(status_error("No client profile data provided"));
        };

        if let Value::Object(map) = &mut risk {
            map.insert("engine".to_string(), Value::from("multi_agent"));
            map.insert("compliance".to_string(), Value::Object(compliance));
        }

        info!(user = %user.id, "risk panel completed");
        Ok(risk)
    }
}
