//! Flag Evaluator Module
//!
//! Holds the flag registry and answers per-user feature checks.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use tracing::{info, warn};

use crate::flags::{rollout_bucket, DEFAULT_FLAGS};

// == Flag Evaluator ==
/// Registry of feature rollout fractions.
///
/// Reads share the lock; `update_flag` is the only writer.
#[derive(Debug)]
pub struct FlagEvaluator {
    flags: RwLock<BTreeMap<String, f64>>,
}

impl FlagEvaluator {
    // == Constructor ==
    /// Creates an evaluator from `(feature, fraction)` pairs.
    ///
    /// Fractions outside [0, 1] are clamped into range.
    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let flags = flags
            .into_iter()
            .map(|(name, fraction)| {
                let fraction = if fraction.is_nan() {
                    0.0
                } else {
                    fraction.clamp(0.0, 1.0)
                };
                (name.into(), fraction)
            })
            .collect();

        Self {
            flags: RwLock::new(flags),
        }
    }

    /// Creates an evaluator seeded with [`DEFAULT_FLAGS`].
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_FLAGS.iter().copied())
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, f64>> {
        self.flags.read().unwrap_or_else(PoisonError::into_inner)
    }

    // == Is Enabled ==
    /// Checks whether `feature` is on for `user_id`.
    ///
    /// Unknown features are off. Fractions of 1.0 and 0.0 short-circuit;
    /// anything in between compares the user's stable bucket to the fraction.
    pub fn is_enabled(&self, feature: &str, user_id: &str) -> bool {
        let fraction = match self.read().get(feature) {
            Some(fraction) => *fraction,
            None => return false,
        };
        Self::evaluate(feature, fraction, user_id)
    }

    fn evaluate(feature: &str, fraction: f64, user_id: &str) -> bool {
        if fraction >= 1.0 {
            return true;
        }
        if fraction <= 0.0 {
            return false;
        }
        rollout_bucket(user_id, feature) < fraction
    }

    // == Update Flag ==
    /// Sets the rollout fraction for `feature`, creating it if needed.
    ///
    /// Returns `false` and leaves the registry untouched when `fraction` is
    /// outside [0, 1] or not a number.
    pub fn update_flag(&self, feature: &str, fraction: f64) -> bool {
        if !(0.0..=1.0).contains(&fraction) {
            warn!(feature = %feature, fraction, "rejected flag update outside [0, 1]");
            return false;
        }

        let mut flags = self.flags.write().unwrap_or_else(PoisonError::into_inner);
        let previous = flags.insert(feature.to_string(), fraction);
        info!(feature = %feature, fraction, ?previous, "feature flag updated");
        true
    }

    // == Get All Flags ==
    /// Returns a snapshot of every registered fraction.
    pub fn get_all_flags(&self) -> BTreeMap<String, f64> {
        self.read().clone()
    }

    // == Get User Flags ==
    /// Evaluates every registered feature for `user_id`.
    pub fn get_user_flags(&self, user_id: &str) -> BTreeMap<String, bool> {
        self.read()
            .iter()
            .map(|(feature, fraction)| {
                (
                    feature.clone(),
                    Self::evaluate(feature, *fraction, user_id),
                )
            })
            .collect()
    }
}

impl Default for FlagEvaluator {
    fn default() -> Self {
        Self::with_defaults()
    }
}
