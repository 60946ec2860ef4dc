//! Prediction policy constants.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunable constants used by the prediction engine.
///
/// Stored as a JSON object on disk; any omitted key keeps its default:
/// ```json
/// {
///   "min_tread_mm": 3.0,
///   "default_avg_monthly_km": 5000.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WearPolicy {
    /// Tread depth at which a tire is retired, in millimetres.
    pub min_tread_mm: f64,
    /// Monthly distance assumed when a tire carries no figure of its own.
    pub default_avg_monthly_km: f64,
    /// Days until retirement reported when the monthly distance is not positive.
    pub fallback_retirement_days: f64,
    /// Legal minimum used by the snapshot lifecycle forecast.
    pub legal_min_tread_mm: f64,
    pub critical_below_mm: f64,
    pub urgent_below_mm: f64,
    pub attention_below_mm: f64,
}

impl Default for WearPolicy {
    fn default() -> Self {
        Self {
            min_tread_mm: 3.0,
            default_avg_monthly_km: 5000.0,
            fallback_retirement_days: 365.0,
            legal_min_tread_mm: 1.6,
            critical_below_mm: 2.0,
            urgent_below_mm: 3.0,
            attention_below_mm: 5.0,
        }
    }
}

impl WearPolicy {
    /// Loads the policy from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read policy file '{path}'"))?;
        let policy: WearPolicy = serde_json::from_str(&content)
            .with_context(|| format!("invalid policy file '{path}'"))?;
        Ok(policy)
    }

    /// Returns the policy stored at `path`, or the defaults when no path is given.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
