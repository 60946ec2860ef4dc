use crate::prediction::types::{MonthlyWear, TreadReading};
use crate::prediction::utility::mean;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Averages tread readings per calendar month (UTC), oldest month first.
///
/// Readings taken before `since` are ignored. A reading without a tread value
/// counts as 0 mm.
pub fn monthly_wear_history(readings: &[TreadReading], since: DateTime<Utc>) -> Vec<MonthlyWear> {
    let mut months: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for reading in readings.iter().filter(|r| r.timestamp >= since) {
        months
            .entry(reading.timestamp.format("%Y-%m").to_string())
            .or_default()
            .push(reading.avg_tread_mm.unwrap_or(0.0));
    }

    months
        .into_iter()
        .map(|(month, values)| MonthlyWear {
            month,
            avg_tread_mm: mean(&values),
            inspections_count: values.len(),
        })
        .collect()
}
