//! Response DTOs for the routing service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;
use crate::metrics::MetricsSnapshot;

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Service version
    pub version: String,
    /// Deployment environment
    pub environment: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(environment: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: environment.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// One tool in the listing (GET /mcp/tools)
#[derive(Debug, Clone, Serialize)]
pub struct ToolListEntry {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    /// Whether the caller may use this tool
    pub enabled: bool,
}

/// Response body for the tool listing (GET /mcp/tools)
#[derive(Debug, Clone, Serialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolListEntry>,
}

/// Response body for GET /flags/me
#[derive(Debug, Clone, Serialize)]
pub struct UserFlagsResponse {
    pub user_id: String,
    pub flags: BTreeMap<String, bool>,
}

/// Response body for PUT /flags/:feature
#[derive(Debug, Clone, Serialize)]
pub struct UpdateFlagResponse {
    /// Success message
    pub message: String,
    pub feature: String,
    pub fraction: f64,
}

impl UpdateFlagResponse {
    pub fn new(feature: impl Into<String>, fraction: f64) -> Self {
        let feature = feature.into();
        Self {
            message: format!("Flag '{}' set to {}", feature, fraction),
            feature,
            fraction,
        }
    }
}

/// Response body for DELETE /cache/:key and DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheClearResponse {
    /// False when the store could not be reached
    pub success: bool,
    /// Key or pattern that was cleared
    pub target: String,
}

/// Response body for the dashboard endpoint (GET /dashboard)
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub documents_processed: u64,
    pub compliance_checks: u64,
    pub risk_predictions: u64,
    pub chat_interactions: u64,
    pub total_requests: u64,
    pub avg_processing_time: f64,
    pub success_rate: f64,
    pub cache: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub cache_hit_rate: f64,
}

impl DashboardResponse {
    pub fn new(metrics: MetricsSnapshot, cache: CacheStats) -> Self {
        Self {
            documents_processed: metrics.documents_processed,
            compliance_checks: metrics.compliance_checks,
            risk_predictions: metrics.risk_predictions,
            chat_interactions: metrics.chat_interactions,
            total_requests: metrics.total_requests,
            avg_processing_time: metrics.avg_processing_time,
            success_rate: metrics.success_rate,
            cache_hit_rate: cache.hit_rate(),
            cache,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy("test");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["environment"], "test");
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_update_flag_response() {
        let resp = UpdateFlagResponse::new("beta", 0.5);
        assert_eq!(resp.feature, "beta");
        assert!(resp.message.contains("beta"));
    }

    #[test]
    fn test_dashboard_hit_rate() {
        let cache = CacheStats {
            hits: 8,
            misses: 2,
            ..CacheStats::default()
        };
        let snapshot = MetricsSnapshot {
            documents_processed: 1,
            compliance_checks: 0,
            risk_predictions: 0,
            chat_interactions: 0,
            total_requests: 4,
            avg_processing_time: 0.1,
            success_rate: 1.0,
        };

        let resp = DashboardResponse::new(snapshot, cache);
        assert!((resp.cache_hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.documents_processed, 1);
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("Something went wrong"));
    }
}
