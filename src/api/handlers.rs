//! API Handlers
//!
//! HTTP request handlers for the tool, flag, cache and monitoring endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::auth::{bearer_token, Authenticator, JwtAuthenticator, User};
use crate::cache::{ComputeCache, DEFAULT_TTL_SECS};
use crate::config::Config;
use crate::error::{AppError, MetricsResult, Result};
use crate::flags::{FlagEvaluator, CONVERSATIONAL_UI, GENAI_ANALYSIS, MULTI_AGENT_SYSTEM};
use crate::metrics::{MetricsCollector, ToolCounter};
use crate::models::{
    CacheClearResponse, ClearCacheQuery, DashboardResponse, HealthResponse, ToolListEntry,
    ToolListResponse, UpdateFlagRequest, UpdateFlagResponse, UserFlagsResponse,
};
use crate::store::KvStore;
use crate::tools::{
    RiskPanel, ToolExecutor, ToolRegistry, COMPLIANCE_VALIDATOR, CONVERSATIONAL_ASSISTANT,
    DOCUMENT_ANALYZER, RISK_PREDICTOR,
};
use crate::validation::InputValidator;

/// Prefix of every cached document analysis
pub const DOC_ANALYSIS_PREFIX: &str = "doc_analysis:";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub flags: Arc<FlagEvaluator>,
    pub cache: Arc<ComputeCache>,
    pub auth: Arc<dyn Authenticator>,
    pub validator: InputValidator,
    pub tools: ToolRegistry,
    pub risk_panel: Arc<RiskPanel>,
    pub metrics: Arc<MetricsCollector>,
    /// Lifetime of cached tool results, in seconds
    pub cache_ttl: u64,
    /// Reported by the health check
    pub environment: String,
}

impl AppState {
    /// Creates a new AppState with default flags, tools and limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics registry cannot be built.
    pub fn new(store: Arc<dyn KvStore>, auth: Arc<dyn Authenticator>) -> MetricsResult<Self> {
        Ok(Self {
            flags: Arc::new(FlagEvaluator::with_defaults()),
            cache: Arc::new(ComputeCache::new(store)),
            auth,
            validator: InputValidator::default(),
            tools: ToolRegistry::with_defaults(),
            risk_panel: Arc::new(RiskPanel::new()),
            metrics: Arc::new(MetricsCollector::new()?),
            cache_ttl: DEFAULT_TTL_SECS,
            environment: "development".to_string(),
        })
    }

    /// Creates a new AppState from configuration.
    ///
    /// Tokens are verified with the configured secret; store calls and
    /// cached computations are bounded by the configured timeouts.
    pub fn from_config(config: &Config, store: Arc<dyn KvStore>) -> MetricsResult<Self> {
        let auth = Arc::new(JwtAuthenticator::new(config.jwt_secret.clone()));
        let cache = ComputeCache::with_timeout(store.clone(), config.store_timeout())
            .with_compute_timeout(config.compute_timeout());
        Ok(Self {
            cache: Arc::new(cache),
            validator: InputValidator::new(config.max_document_bytes),
            cache_ttl: config.cache_ttl,
            environment: config.environment.clone(),
            ..Self::new(store, auth)?
        })
    }

    /// Replaces the flag registry.
    pub fn with_flags(mut self, flags: FlagEvaluator) -> Self {
        self.flags = Arc::new(flags);
        self
    }

    fn tool(&self, name: &str) -> Result<Arc<dyn ToolExecutor>> {
        self.tools
            .get(name)
            .ok_or_else(|| AppError::Internal(format!("tool '{}' is not registered", name)))
    }

    fn require_flag(&self, feature: &str, user: &User) -> Result<()> {
        if self.flags.is_enabled(feature, &user.id) {
            return Ok(());
        }
        info!(user = %user.id, feature = %feature, "request blocked by feature flag");
        Err(AppError::FeatureDisabled(feature.to_string()))
    }
}

// == Authenticated Caller ==
/// Extractor resolving the bearer token to a [`User`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user = state.auth.authenticate(token).await?;
        Ok(AuthUser(user))
    }
}

/// Cache key for a document analysis request.
///
/// Hashes the canonical JSON body together with the document's size and
/// modification time, so an edited file is analyzed again.
pub async fn document_cache_key(request: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.to_string().as_bytes());

    let metadata = match request.get("document_path").and_then(Value::as_str) {
        Some(path) => tokio::fs::metadata(path).await.ok(),
        None => None,
    };
    if let Some(metadata) = metadata {
        hasher.update(metadata.len().to_be_bytes());
        if let Some(modified) = metadata
            .modified()
            .ok()
            .and_then(|at| at.duration_since(UNIX_EPOCH).ok())
        {
            hasher.update(modified.as_nanos().to_be_bytes());
        }
    }

    format!("{}{}", DOC_ANALYSIS_PREFIX, hex::encode(hasher.finalize()))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.environment.clone()))
}

/// Handler for GET /mcp/tools
///
/// Lists every tool with whether it is enabled for the caller.
pub async fn list_tools_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .iter()
        .map(|(_, tool)| {
            let info = tool.info();
            let enabled = info
                .gate
                .map_or(true, |feature| state.flags.is_enabled(feature, &user.id));
            ToolListEntry {
                name: info.name,
                description: info.description,
                parameters: info.parameters,
                enabled,
            }
        })
        .collect();

    Json(ToolListResponse { tools })
}

/// Handler for POST /mcp/tools/analyze_document
///
/// Results are served from the compute cache when an identical request for
/// an unchanged document was analyzed within the cache TTL.
pub async fn analyze_document_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<Value>,
) -> Result<Json<Value>> {
    state
        .validator
        .validate_document_analysis_request(&request)
        .await?;
    state.require_flag(GENAI_ANALYSIS, &user)?;

    let tool = state.tool(DOCUMENT_ANALYZER)?;
    let key = document_cache_key(&request).await;
    let compute = {
        let (tool, request, user) = (&tool, &request, &user);
        move || async move { tool.execute(request, user).await }
    };

    let result = state
        .cache
        .get_or_compute(&key, compute, state.cache_ttl)
        .await
        .map_err(|e| {
            error!(user = %user.id, error = %e, "document analysis failed");
            AppError::tool("Analysis failed", e)
        })?;

    state.metrics.incr(ToolCounter::DocumentProcessed);
    Ok(Json(result))
}

/// Handler for POST /mcp/tools/validate_compliance
pub async fn validate_compliance_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<Value>,
) -> Result<Json<Value>> {
    state.validator.validate_compliance_request(&request)?;

    let result = state
        .tool(COMPLIANCE_VALIDATOR)?
        .execute(&request, &user)
        .await
        .map_err(|e| {
            error!(user = %user.id, error = %e, "compliance validation failed");
            AppError::tool("Validation failed", e)
        })?;

    state.metrics.incr(ToolCounter::ComplianceCheck);
    Ok(Json(result))
}

/// Handler for POST /mcp/tools/predict_risk
///
/// Users in the `multi_agent_system` rollout get the combined risk and
/// compliance panel; everyone else gets the plain risk model.
pub async fn predict_risk_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<Value>,
) -> Result<Json<Value>> {
    state.validator.validate_risk_prediction_request(&request)?;

    let outcome = if state.flags.is_enabled(MULTI_AGENT_SYSTEM, &user.id) {
        state.risk_panel.analyze(&request, &user).await
    } else {
        state.tool(RISK_PREDICTOR)?.execute(&request, &user).await
    };

    let result = outcome.map_err(|e| {
        error!(user = %user.id, error = %e, "risk prediction failed");
        AppError::tool("Prediction failed", e)
    })?;

    state.metrics.incr(ToolCounter::RiskPrediction);
    Ok(Json(result))
}

/// Handler for POST /mcp/tools/chat
pub async fn chat_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<Value>,
) -> Result<Json<Value>> {
    state.require_flag(CONVERSATIONAL_UI, &user)?;
    state.validator.validate_chat_request(&request)?;

    let result = state
        .tool(CONVERSATIONAL_ASSISTANT)?
        .execute(&request, &user)
        .await
        .map_err(|e| {
            error!(user = %user.id, error = %e, "chat failed");
            AppError::tool("Chat failed", e)
        })?;

    state.metrics.incr(ToolCounter::ChatInteraction);
    Ok(Json(result))
}

/// Handler for GET /flags
pub async fn list_flags_handler(State(state): State<AppState>) -> Json<BTreeMap<String, f64>> {
    Json(state.flags.get_all_flags())
}

/// Handler for GET /flags/me
pub async fn user_flags_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Json<UserFlagsResponse> {
    let flags = state.flags.get_user_flags(&user.id);
    Json(UserFlagsResponse {
        user_id: user.id,
        flags,
    })
}

/// Handler for PUT /flags/:feature
pub async fn update_flag_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(feature): Path<String>,
    Json(req): Json<UpdateFlagRequest>,
) -> Result<Json<UpdateFlagResponse>> {
    if !state.flags.update_flag(&feature, req.fraction) {
        return Err(AppError::InvalidRequest(
            "fraction must be between 0 and 1".to_string(),
        ));
    }

    info!(user = %user.id, feature = %feature, fraction = req.fraction, "flag changed over HTTP");
    Ok(Json(UpdateFlagResponse::new(feature, req.fraction)))
}

/// Handler for DELETE /cache/:key
pub async fn delete_cache_key_handler(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(key): Path<String>,
) -> Json<CacheClearResponse> {
    let success = state.cache.delete(&key).await;
    Json(CacheClearResponse {
        success,
        target: key,
    })
}

/// Handler for DELETE /cache?pattern=
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(query): Query<ClearCacheQuery>,
) -> Result<Json<CacheClearResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let pattern = query.pattern.unwrap_or_default();
    let success = state.cache.clear_pattern(&pattern).await;
    Ok(Json(CacheClearResponse {
        success,
        target: pattern,
    }))
}

/// Handler for GET /metrics
///
/// Prometheus text exposition of request, tool and cache counters.
pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let body = state
        .metrics
        .render_prometheus(&state.cache.stats())
        .map_err(|e| {
            error!(error = %e, "metrics encoding failed");
            AppError::Internal(e.to_string())
        })?;
    Ok((
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        body,
    ))
}

/// Handler for GET /dashboard
pub async fn dashboard_handler(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(DashboardResponse::new(
        state.metrics.snapshot(),
        state.cache.stats(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ComputeTimeout, ToolError};
    use crate::store::{FailingStore, MemoryStore};
    use crate::tools::ToolInfo;
    use serde_json::json;
    use std::io::Write;
    use std::time::Duration;

    fn state_with(store: Arc<dyn KvStore>, flags: &[(&str, f64)]) -> AppState {
        AppState::new(store, Arc::new(JwtAuthenticator::new("test-secret")))
            .unwrap()
            .with_flags(FlagEvaluator::new(flags.iter().copied()))
    }

    fn all_on() -> AppState {
        state_with(
            Arc::new(MemoryStore::new(100)),
            &[
                (GENAI_ANALYSIS, 1.0),
                (MULTI_AGENT_SYSTEM, 1.0),
                (CONVERSATIONAL_UI, 1.0),
            ],
        )
    }

    fn caller() -> AuthUser {
        AuthUser(User {
            id: "user-42".to_string(),
        })
    }

    fn pdf() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"Account opening form").unwrap();
        file
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler(State(all_on())).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.environment, "development");
    }

    #[tokio::test]
    async fn test_analyze_document_is_cached() {
        let state = all_on();
        let file = pdf();
        let request = json!({"document_path": file.path().to_str().unwrap()});

        let first = analyze_document_handler(State(state.clone()), caller(), Json(request.clone()))
            .await
            .unwrap();
        let second = analyze_document_handler(State(state.clone()), caller(), Json(request))
            .await
            .unwrap();

        assert_eq!(first.0, second.0);
        let stats = state.cache.stats();
        assert_eq!(stats.computations, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(state.metrics.snapshot().documents_processed, 2);
    }

    #[tokio::test]
    async fn test_analyze_document_survives_store_outage() {
        let state = state_with(Arc::new(FailingStore), &[(GENAI_ANALYSIS, 1.0)]);
        let file = pdf();
        let request = json!({"document_path": file.path().to_str().unwrap()});

        let result = analyze_document_handler(State(state.clone()), caller(), Json(request))
            .await
            .unwrap();

        assert_eq!(result["status"], "success");
        assert!(state.cache.stats().store_errors > 0);
    }

    /// Analyzer whose model call never returns.
    struct HungAnalyzer;

    #[async_trait]
    impl ToolExecutor for HungAnalyzer {
        fn info(&self) -> ToolInfo {
            ToolInfo {
                name: DOCUMENT_ANALYZER.to_string(),
                description: "never answers".to_string(),
                parameters: json!({}),
                gate: Some(GENAI_ANALYSIS),
            }
        }

        async fn execute(
            &self,
            _arguments: &Value,
            _user: &User,
        ) -> std::result::Result<Value, ToolError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_analyze_document_hung_tool_times_out() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new(100));
        let mut state = state_with(store.clone(), &[(GENAI_ANALYSIS, 1.0)]);
        state.tools.register(DOCUMENT_ANALYZER, Arc::new(HungAnalyzer));
        state.cache = Arc::new(
            ComputeCache::new(store).with_compute_timeout(Duration::from_millis(20)),
        );
        let file = pdf();
        let request = json!({"document_path": file.path().to_str().unwrap()});

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            analyze_document_handler(State(state.clone()), caller(), Json(request)),
        )
        .await
        .expect("handler must give up on a hung tool");

        assert!(matches!(
            result,
            Err(AppError::ToolFailed {
                source: ToolError::TimedOut(ComputeTimeout(20)),
                ..
            })
        ));
        assert_eq!(state.metrics.snapshot().documents_processed, 0);
    }

    #[tokio::test]
    async fn test_metrics_handler_encodes_counters() {
        let state = all_on();
        state.metrics.incr(ToolCounter::ChatInteraction);

        let response = metrics_handler(State(state)).await.unwrap().into_response();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            prometheus::TEXT_FORMAT
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("chat_interactions_total 1"));
    }

    #[tokio::test]
    async fn test_analyze_document_flag_off() {
        let state = state_with(Arc::new(MemoryStore::new(100)), &[(GENAI_ANALYSIS, 0.0)]);
        let file = pdf();
        let request = json!({"document_path": file.path().to_str().unwrap()});

        let result = analyze_document_handler(State(state), caller(), Json(request)).await;
        assert!(matches!(result, Err(AppError::FeatureDisabled(_))));
    }

    #[tokio::test]
    async fn test_analyze_document_validation_runs_first() {
        let state = state_with(Arc::new(MemoryStore::new(100)), &[(GENAI_ANALYSIS, 0.0)]);
        let request = json!({"document_path": "/nonexistent/form.exe"});

        let result = analyze_document_handler(State(state), caller(), Json(request)).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_document_cache_key_tracks_content() {
        let mut file = pdf();
        let request = json!({"document_path": file.path().to_str().unwrap()});

        let before = document_cache_key(&request).await;
        assert!(before.starts_with(DOC_ANALYSIS_PREFIX));
        assert_eq!(before, document_cache_key(&request).await);

        file.write_all(b" amended").unwrap();
        file.flush().unwrap();
        assert_ne!(before, document_cache_key(&request).await);
    }

    #[tokio::test]
    async fn test_predict_risk_paths() {
        let request = json!({"client_profile": {"risk_indicators": [0.1]}});

        let panel = predict_risk_handler(State(all_on()), caller(), Json(request.clone()))
            .await
            .unwrap();
        assert_eq!(panel["engine"], "multi_agent");

        let plain_state = state_with(Arc::new(MemoryStore::new(100)), &[(MULTI_AGENT_SYSTEM, 0.0)]);
        let plain = predict_risk_handler(State(plain_state), caller(), Json(request))
            .await
            .unwrap();
        assert_eq!(plain["risk_level"], "low");
        assert!(plain.get("engine").is_none());
    }

    #[tokio::test]
    async fn test_chat_flag_checked_before_validation() {
        let state = state_with(Arc::new(MemoryStore::new(100)), &[(CONVERSATIONAL_UI, 0.0)]);

        let result = chat_handler(State(state), caller(), Json(json!({}))).await;
        assert!(matches!(result, Err(AppError::FeatureDisabled(_))));
    }

    #[tokio::test]
    async fn test_compliance_counts_success() {
        let state = all_on();
        let request = json!({"client_data": {"name": "Acme"}, "jurisdictions": ["MAS"]});

        let result = validate_compliance_handler(State(state.clone()), caller(), Json(request))
            .await
            .unwrap();

        assert_eq!(result["results"]["MAS"], "compliant");
        assert_eq!(state.metrics.snapshot().compliance_checks, 1);
    }

    #[tokio::test]
    async fn test_list_tools_reflects_flags() {
        let state = state_with(
            Arc::new(MemoryStore::new(100)),
            &[(GENAI_ANALYSIS, 1.0), (CONVERSATIONAL_UI, 0.0)],
        );

        let response = list_tools_handler(State(state), caller()).await;
        let enabled: BTreeMap<&str, bool> = response
            .tools
            .iter()
            .map(|tool| (tool.name.as_str(), tool.enabled))
            .collect();

        assert!(enabled[DOCUMENT_ANALYZER]);
        assert!(enabled[RISK_PREDICTOR]);
        assert!(!enabled[CONVERSATIONAL_ASSISTANT]);
    }

    #[tokio::test]
    async fn test_update_flag_handler() {
        let state = all_on();

        let ok = update_flag_handler(
            State(state.clone()),
            caller(),
            Path("beta".to_string()),
            Json(UpdateFlagRequest { fraction: 0.25 }),
        )
        .await;
        assert!(ok.is_ok());
        assert_eq!(state.flags.get_all_flags()["beta"], 0.25);

        let rejected = update_flag_handler(
            State(state.clone()),
            caller(),
            Path("beta".to_string()),
            Json(UpdateFlagRequest { fraction: 1.5 }),
        )
        .await;
        assert!(matches!(rejected, Err(AppError::InvalidRequest(_))));
        assert_eq!(state.flags.get_all_flags()["beta"], 0.25);
    }

    #[tokio::test]
    async fn test_clear_cache_handler() {
        let state = all_on();
        state.cache.set("doc_analysis:abc", &json!(1), 60).await;

        let missing = clear_cache_handler(
            State(state.clone()),
            caller(),
            Query(ClearCacheQuery::default()),
        )
        .await;
        assert!(matches!(missing, Err(AppError::InvalidRequest(_))));

        let cleared = clear_cache_handler(
            State(state.clone()),
            caller(),
            Query(ClearCacheQuery {
                pattern: Some("doc_analysis:*".to_string()),
            }),
        )
        .await
        .unwrap();
        assert!(cleared.success);
        assert!(state.cache.get::<Value>("doc_analysis:abc").await.is_none());
    }

    #[tokio::test]
    async fn test_delete_cache_key_reports_outage() {
        let state = state_with(Arc::new(FailingStore), &[]);

        let response =
            delete_cache_key_handler(State(state), caller(), Path("k".to_string())).await;
        assert!(!response.success);
    }
}
