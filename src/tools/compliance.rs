//! Compliance Validator
//!
//! Checks client data against regulatory frameworks per jurisdiction.

use std::str::FromStr;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::auth::User;
use crate::error::ToolError;
use crate::tools::{status_error, ToolExecutor, ToolInfo, COMPLIANCE_VALIDATOR};

// == Jurisdiction ==
/// Supported regulatory frameworks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jurisdiction {
    /// Monetary Authority of Singapore
    Mas,
    /// Hong Kong Monetary Authority
    Hkma,
    /// US Securities and Exchange Commission
    Sec,
}

impl Jurisdiction {
    pub const ALL: [Jurisdiction; 3] = [Jurisdiction::Mas, Jurisdiction::Hkma, Jurisdiction::Sec];

    pub fn code(&self) -> &'static str {
        match self {
            Jurisdiction::Mas => "MAS",
            Jurisdiction::Hkma => "HKMA",
            Jurisdiction::Sec => "SEC",
        }
    }

    /// Runs this framework's checks. Every framework currently passes.
    pub fn check(&self, _client_data: &Value) -> &'static str {
        "compliant"
    }
}

impl FromStr for Jurisdiction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Jurisdiction::ALL
            .into_iter()
            .find(|j| j.code() == s)
            .ok_or_else(|| format!("Unsupported jurisdiction: {}", s))
    }
}

#[derive(Debug, Default)]
pub struct ComplianceValidator;

impl ComplianceValidator {
    pub fn new() -> Self {
        Self
    }

    /// Checks `client_data` against each named jurisdiction, skipping unknown ones.
    pub fn validate(&self, jurisdictions: &[&str], client_data: &Value) -> Map<String, Value> {
        let mut results = Map::new();
        for code in jurisdictions {
            match code.parse::<Jurisdiction>() {
                Ok(jurisdiction) => {
                    results.insert(
                        jurisdiction.code().to_string(),
                        Value::from(jurisdiction.check(client_data)),
                    );
                }
                Err(reason) => warn!("{}", reason),
            }
        }
        results
    }
}

#[async_trait]
impl ToolExecutor for ComplianceValidator {
    fn info(&self) -> ToolInfo {
        ToolInfo {
            name: COMPLIANCE_VALIDATOR.to_string(),
            description: "Validate regulatory compliance using preset frameworks for financial services onboarding".to_string(),
            parameters: json!({
                "jurisdictions": {
                    "type": "array",
                    "items": { "type": "string", "enum": ["MAS", "HKMA", "SEC"] },
                    "description": "List of jurisdictions to validate against",
                    "required": true
                },
                "client_data": {
                    "type": "object",
                    "description": "Client data to validate",
                    "required": true
                }
            }),
            gate: None,
        }
    }

    async fn execute(&self, arguments: &Value, user: &User) -> Result<Value, ToolError> {
        let jurisdictions: Vec<&str> = arguments
            .get("jurisdictions")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        if jurisdictions.is_empty() {
            return Ok(status_error("No jurisdictions specified"));
        }

        let client_data = arguments.get("client_data").unwrap_or(&Value::Null);
        let results = self.validate(&jurisdictions, client_data);

        info!(user = %user.id, ?jurisdictions, "compliance validation completed");
        Ok(json!({
            "status": "success",
            "results": results,
        }))
    }
}
