//! Request DTOs for the routing service API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

/// Request body for `PUT /flags/:feature`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFlagRequest {
    /// New rollout fraction in [0, 1]
    pub fraction: f64,
}

/// Query string for `DELETE /cache`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearCacheQuery {
    /// Glob pattern of keys to remove, e.g. `doc_analysis:*`
    #[serde(default)]
    pub pattern: Option<String>,
}

impl ClearCacheQuery {
    /// Validates the query
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match self.pattern.as_deref() {
            None | Some("") => Some("Query parameter 'pattern' is required".to_string()),
            Some(_) => None,
        }
    }
}
