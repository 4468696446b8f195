//! Onboarding Hub - request routing for onboarding analysis tools
//!
//! Sticky percentage rollouts decide which callers see which tools, and a
//! cache-aside layer in front of a key-value store keeps repeated analyses
//! cheap without making the store a hard dependency.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod flags;
pub mod metrics;
pub mod models;
pub mod store;
pub mod tasks;
pub mod tools;
pub mod validation;

pub use api::AppState;
pub use cache::ComputeCache;
pub use config::Config;
pub use flags::FlagEvaluator;
pub use tasks::spawn_cleanup_task;
