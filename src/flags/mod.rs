//! Feature Flags Module
//!
//! Sticky percentage rollout: each user lands in a fixed bucket per feature,
//! and a feature is on for that user when the bucket falls below the
//! feature's rollout fraction.

mod evaluator;
mod rollout;

pub use evaluator::FlagEvaluator;
pub use rollout::rollout_bucket;

// == Default Flags ==
/// Flag table loaded at startup, as `(feature, rollout_fraction)`.
pub const DEFAULT_FLAGS: &[(&str, f64)] = &[
    ("genai_analysis", 1.0),
    ("multi_agent_system", 0.1),
    ("conversational_ui", 0.5),
    ("batch_processing", 0.2),
    ("advanced_risk_scoring", 0.05),
    ("real_time_compliance", 0.3),
];

// == Feature Names ==
/// Gates the document analysis tool
pub const GENAI_ANALYSIS: &str = "genai_analysis";
/// Routes risk prediction through the combined risk/compliance panel
pub const MULTI_AGENT_SYSTEM: &str = "multi_agent_system";
/// Gates the conversational assistant
pub const CONVERSATIONAL_UI: &str = "conversational_ui";
