use crate::config::WearPolicy;
use crate::prediction::benchmark::{benchmark_brands, fleet_rows};
use crate::prediction::metrics::calculate_tire_metrics_on;
use crate::prediction::types::{
    FleetReport, FleetSummary, TireHistory, TireReport, WearMetrics,
};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const SCHEMA_VERSION: u8 = 1;

/// Runs the wear calculator over every tire of a fleet and ranks the
/// brand/model groups of the tires that produced full metrics.
pub fn build_fleet_report(
    histories: &[TireHistory],
    policy: &WearPolicy,
    today: NaiveDate,
    tenant_id: Option<&str>,
) -> FleetReport {
    let mut summary = FleetSummary {
        tires: histories.len(),
        ..Default::default()
    };

    let tires: Vec<TireReport> = histories
        .iter()
        .map(|history| {
            let metrics = calculate_tire_metrics_on(
                &history.samples,
                &history.tire.attributes(),
                policy,
                today,
            );

            match &metrics {
                WearMetrics::Success { .. } => summary.successful += 1,
                WearMetrics::AwaitingData { .. } => summary.awaiting_data += 1,
                WearMetrics::Insufficient { .. } => summary.insufficient += 1,
            }

            debug!(
                tire_id = %history.tire.tire_id,
                samples = history.samples.len(),
                status = metrics.status(),
                "Tire metrics computed"
            );

            TireReport {
                tire_id: history.tire.tire_id.clone(),
                serial_number: history.tire.serial_number.clone(),
                brand: history.tire.brand.clone(),
                model: history.tire.model.clone(),
                metrics,
            }
        })
        .collect();

    let ranking = benchmark_brands(&fleet_rows(&tires));

    info!(
        tires = summary.tires,
        successful = summary.successful,
        awaiting_data = summary.awaiting_data,
        insufficient = summary.insufficient,
        groups = ranking.len(),
        "Fleet report built"
    );

    FleetReport {
        schema_version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        tenant_id: tenant_id.map(str::to_string),
        summary,
        tires,
        ranking,
    }
}

/// Writes a report as pretty-printed JSON, creating parent directories as needed.
pub fn write_report_json(path: &str, report: &FleetReport) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory for '{path}'"))?;
        }
    }

    let body = serde_json::to_vec_pretty(report)?;
    fs::write(path, body).with_context(|| format!("failed to write report '{path}'"))?;

    info!(path, "Report written");
    Ok(())
}
