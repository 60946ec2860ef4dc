//! Data types shared by the prediction engine and its collaborators.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::prediction::utility::{round_0, round_1, round_2, round_4};

/// One tread-depth observation of a single tire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionSample {
    pub timestamp: DateTime<Utc>,
    pub odometer_km: f64,
    pub tread_mm: f64,
}

/// Static attributes of a tire, supplied once and not part of the time series.
///
/// Every field is optional; the calculator resolves missing values from the
/// first sample or from the active [`WearPolicy`](crate::config::WearPolicy).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TireAttributes {
    pub initial_tread_mm: Option<f64>,
    pub initial_odometer_km: Option<f64>,
    pub cost: Option<f64>,
    pub avg_monthly_km: Option<f64>,
}

/// Result of running the wear calculator over one tire's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WearMetrics {
    /// No inspections were recorded.
    Insufficient { message: String },
    /// Inspections exist but show no positive wear or distance yet.
    AwaitingData {
        km_per_mm: f64,
        current_wear_percent: f64,
    },
    Success { stats: WearStats },
}

impl WearMetrics {
    pub fn status(&self) -> &'static str {
        match self {
            WearMetrics::Insufficient { .. } => "insufficient",
            WearMetrics::AwaitingData { .. } => "awaiting_data",
            WearMetrics::Success { .. } => "success",
        }
    }

    pub fn stats(&self) -> Option<&WearStats> {
        match self {
            WearMetrics::Success { stats } => Some(stats),
            _ => None,
        }
    }
}

/// Computed wear statistics.
///
/// Values are kept at full precision in memory. Rounding is applied only
/// when the struct is serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WearStats {
    #[serde(serialize_with = "round_2")]
    pub km_per_mm: f64,
    #[serde(serialize_with = "round_2")]
    pub total_km_run: f64,
    #[serde(serialize_with = "round_2")]
    pub total_wear_mm: f64,
    #[serde(serialize_with = "round_0")]
    pub total_estimated_km: f64,
    #[serde(serialize_with = "round_0")]
    pub expected_remaining_km: f64,
    #[serde(serialize_with = "round_4")]
    pub cpk: f64,
    #[serde(serialize_with = "round_1")]
    pub wear_percent: f64,
    pub estimated_retirement_date: NaiveDate,
}

/// Per-tire lifetime distance and CPK, the input to brand benchmarking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetPerformanceRow {
    pub brand: String,
    pub model: String,
    pub total_km: f64,
    pub cpk: f64,
}

/// Mean performance of one (brand, model) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandRanking {
    pub brand: String,
    pub model: String,
    #[serde(serialize_with = "round_0")]
    pub mean_total_km: f64,
    #[serde(serialize_with = "round_4")]
    pub mean_cpk: f64,
}

/// A tire registry row as stored by the fleet backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TireRecord {
    pub tire_id: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    pub initial_tread_mm: Option<f64>,
    pub initial_odometer_km: Option<f64>,
    pub cost: Option<f64>,
    pub avg_monthly_km: Option<f64>,
}

impl TireRecord {
    pub fn attributes(&self) -> TireAttributes {
        TireAttributes {
            initial_tread_mm: self.initial_tread_mm,
            initial_odometer_km: self.initial_odometer_km,
            cost: self.cost,
            avg_monthly_km: self.avg_monthly_km,
        }
    }
}

/// A tire together with every inspection recorded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct TireHistory {
    pub tire: TireRecord,
    pub samples: Vec<InspectionSample>,
}

/// Current-state view of a mounted tire, used for the quick lifecycle forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TireSnapshot {
    pub tire_id: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    pub initial_tread_mm: f64,
    pub current_tread_mm: f64,
    #[serde(default)]
    pub km_run: f64,
}

/// Replacement urgency derived from the current tread depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Critical,
    Urgent,
    Attention,
    Ok,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Urgency::Critical => "CRITICAL",
            Urgency::Urgent => "URGENT",
            Urgency::Attention => "ATTENTION",
            Urgency::Ok => "OK",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleForecast {
    pub tire_id: String,
    pub serial_number: String,
    pub brand: String,
    pub model: String,
    pub current_tread_mm: f64,
    #[serde(serialize_with = "round_1")]
    pub life_percent: f64,
    pub remaining_km: Option<i64>,
    pub urgency: Urgency,
}

/// A single averaged tread reading, as stored per inspection detail.
#[derive(Debug, Clone, PartialEq)]
pub struct TreadReading {
    pub timestamp: DateTime<Utc>,
    pub avg_tread_mm: Option<f64>,
}

/// Average tread depth across all inspections of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyWear {
    pub month: String,
    #[serde(serialize_with = "round_2")]
    pub avg_tread_mm: f64,
    pub inspections_count: usize,
}

/// Wear metrics for one tire, tagged with the identifying registry fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TireReport {
    pub tire_id: String,
    pub serial_number: String,
    pub brand: String,
    pub model: String,
    pub metrics: WearMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FleetSummary {
    pub tires: usize,
    pub successful: usize,
    pub awaiting_data: usize,
    pub insufficient: usize,
}

/// Complete prediction output for a fleet, written as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetReport {
    pub schema_version: u8,
    pub generated_at: DateTime<Utc>,
    pub tenant_id: Option<String>,
    pub summary: FleetSummary,
    pub tires: Vec<TireReport>,
    pub ranking: Vec<BrandRanking>,
}
