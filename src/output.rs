//! Output formatting and persistence for prediction results.
//!
//! Supports pretty-printing, JSON logging, and CSV append of per-tire metrics.

use anyhow::Result;
use chrono::NaiveDate;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, info};

use crate::prediction::types::TireReport;
use crate::prediction::utility::round_to;

/// Flat, presentation-rounded view of a [`TireReport`] for CSV export.
#[derive(Debug, Serialize)]
pub struct MetricsRow {
    pub tire_id: String,
    pub serial_number: String,
    pub brand: String,
    pub model: String,
    pub status: String,
    pub km_per_mm: Option<f64>,
    pub total_estimated_km: Option<f64>,
    pub expected_remaining_km: Option<f64>,
    pub cpk: Option<f64>,
    pub wear_percent: Option<f64>,
    pub estimated_retirement_date: Option<NaiveDate>,
}

impl MetricsRow {
    pub fn from_report(report: &TireReport) -> Self {
        let stats = report.metrics.stats();

        MetricsRow {
            tire_id: report.tire_id.clone(),
            serial_number: report.serial_number.clone(),
            brand: report.brand.clone(),
            model: report.model.clone(),
            status: report.metrics.status().to_string(),
            km_per_mm: stats.map(|s| round_to(s.km_per_mm, 2)),
            total_estimated_km: stats.map(|s| round_to(s.total_estimated_km, 0)),
            expected_remaining_km: stats.map(|s| round_to(s.expected_remaining_km, 0)),
            cpk: stats.map(|s| round_to(s.cpk, 4)),
            wear_percent: stats.map(|s| round_to(s.wear_percent, 1)),
            estimated_retirement_date: stats.map(|s| s.estimated_retirement_date),
        }
    }
}

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl std::fmt::Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends one row per tire report to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_metrics(path: &str, reports: &[TireReport]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = reports.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for report in reports {
        writer.serialize(MetricsRow::from_report(report))?;
    }
    writer.flush()?;

    Ok(())
}
