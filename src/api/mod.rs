//! API Module
//!
//! HTTP handlers and routing for the onboarding tool service.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /mcp/tools` - List tools and whether the caller may use them
//! - `POST /mcp/tools/{analyze_document,validate_compliance,predict_risk,chat}` - Run a tool
//! - `GET /flags`, `GET /flags/me`, `PUT /flags/:feature` - Feature flag rollout
//! - `DELETE /cache/:key`, `DELETE /cache?pattern=` - Invalidate cached results
//! - `GET /metrics`, `GET /dashboard` - Monitoring

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
