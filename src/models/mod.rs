//! Request and Response models for the routing service API
//!
//! Tool endpoints take free-form JSON bodies; the DTOs here cover the
//! flag, cache and monitoring endpoints.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ClearCacheQuery, UpdateFlagRequest};
pub use responses::{
    CacheClearResponse, DashboardResponse, ErrorResponse, HealthResponse, ToolListEntry,
    ToolListResponse, UpdateFlagResponse, UserFlagsResponse,
};
