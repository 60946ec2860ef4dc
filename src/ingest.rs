//! CSV loaders for inspection logs, tire registries, fleet rows and snapshots.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fs::File;
use tracing::{debug, warn};

use crate::prediction::types::{
    FleetPerformanceRow, InspectionSample, TireHistory, TireRecord, TireSnapshot, TreadReading,
};

/// One measured tire within an inspection, as exported from the inspection log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InspectionRow {
    pub tire_id: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub date: DateTime<Utc>,
    pub odometer_km: f64,
    pub tread_mm: f64,
}

impl InspectionRow {
    pub fn sample(&self) -> InspectionSample {
        InspectionSample {
            timestamp: self.date,
            odometer_km: self.odometer_km,
            tread_mm: self.tread_mm,
        }
    }
}

/// Parses an RFC 3339 timestamp, a naive `YYYY-MM-DD[ T]HH:MM:SS[.f]`
/// timestamp (taken as UTC) or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| anyhow!("unrecognised timestamp '{value}'"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| anyhow!("unrecognised timestamp '{value}'"))
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// Reads every row of a CSV file, failing on the first malformed record.
pub fn read_rows<T: DeserializeOwned>(path: &str) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("failed to open '{path}'"))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();

    for (line, result) in rdr.deserialize().enumerate() {
        let record: T = result.with_context(|| format!("{path}: bad record {}", line + 1))?;
        rows.push(record);
    }

    debug!(path, rows = rows.len(), "CSV loaded");
    Ok(rows)
}

/// Attaches inspection rows to their tires, keeping the registry order.
///
/// Tires with no inspections keep an empty history; inspections referring
/// to an unknown tire are dropped.
pub fn join_histories(tires: Vec<TireRecord>, rows: &[InspectionRow]) -> Vec<TireHistory> {
    let index: HashMap<&str, usize> = tires
        .iter()
        .enumerate()
        .map(|(i, tire)| (tire.tire_id.as_str(), i))
        .collect();

    let mut samples: Vec<Vec<InspectionSample>> = vec![Vec::new(); tires.len()];
    let mut orphans = 0usize;

    for row in rows {
        match index.get(row.tire_id.as_str()) {
            Some(&i) => samples[i].push(row.sample()),
            None => orphans += 1,
        }
    }

    if orphans > 0 {
        warn!(orphans, "Dropped inspections for tires missing from the registry");
    }

    tires
        .into_iter()
        .zip(samples)
        .map(|(tire, samples)| TireHistory { tire, samples })
        .collect()
}

/// Loads the tire registry and inspection log and joins them per tire.
pub fn load_histories(inspections_path: &str, tires_path: &str) -> Result<Vec<TireHistory>> {
    let tires: Vec<TireRecord> = read_rows(tires_path)?;
    let rows: Vec<InspectionRow> = read_rows(inspections_path)?;
    Ok(join_histories(tires, &rows))
}

/// Loads the inspection log as plain tread readings, one per measured tire.
pub fn load_tread_readings(inspections_path: &str) -> Result<Vec<TreadReading>> {
    let rows: Vec<InspectionRow> = read_rows(inspections_path)?;
    Ok(rows
        .into_iter()
        .map(|row| TreadReading {
            timestamp: row.date,
            avg_tread_mm: Some(row.tread_mm),
        })
        .collect())
}

pub fn load_snapshots(path: &str) -> Result<Vec<TireSnapshot>> {
    read_rows(path)
}

/// Loads fleet performance rows, skipping records that fail to parse.
pub fn load_fleet_rows(path: &str) -> Result<Vec<FleetPerformanceRow>> {
    let file = File::open(path).with_context(|| format!("failed to open '{path}'"))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();

    for (line, result) in rdr.deserialize().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => warn!(path, record = line + 1, error = %e, "Skipping malformed fleet row"),
        }
    }

    Ok(rows)
}
