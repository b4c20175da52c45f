//! Tunables for path processing and progress reporting.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixes further than this from the last accepted fix are treated as noise.
pub const NOISE_THRESHOLD_KM: f64 = 0.2;

/// Speed-based mode inference is withheld until this much trip time elapsed.
pub const MODE_INFERENCE_MIN_SECS: u64 = 10;

pub const DEFAULT_MONTHLY_GOAL_KM: f64 = 50.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub noise_threshold_km: f64,
    pub mode_inference_min_secs: u64,
    pub monthly_goal_km: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            noise_threshold_km: NOISE_THRESHOLD_KM,
            mode_inference_min_secs: MODE_INFERENCE_MIN_SECS,
            monthly_goal_km: DEFAULT_MONTHLY_GOAL_KM,
        }
    }
}

impl TrackingConfig {
    /// Reads overrides from `COMMUTE_*` environment variables. Missing or
    /// unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            noise_threshold_km: env_or("COMMUTE_NOISE_THRESHOLD_KM", defaults.noise_threshold_km),
            mode_inference_min_secs: env_or(
                "COMMUTE_MODE_INFERENCE_MIN_SECS",
                defaults.mode_inference_min_secs,
            ),
            monthly_goal_km: env_or("COMMUTE_MONTHLY_GOAL_KM", defaults.monthly_goal_km),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable {key}={raw}");
            default
        }),
        Err(_) => default,
    }
}
