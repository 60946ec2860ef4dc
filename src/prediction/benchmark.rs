use crate::prediction::types::{BrandRanking, FleetPerformanceRow, TireReport};
use crate::prediction::utility::mean;
use std::collections::HashMap;
use tracing::warn;

/// Groups fleet rows by `(brand, model)` and ranks the groups by mean CPK,
/// cheapest first.
///
/// Groups keep the order in which they first appear, and the sort is stable,
/// so equal mean CPKs stay in encounter order. Rows carrying a non-finite
/// distance or CPK are skipped.
pub fn benchmark_brands(rows: &[FleetPerformanceRow]) -> Vec<BrandRanking> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<((&str, &str), Vec<f64>, Vec<f64>)> = Vec::new();

    for row in rows {
        if !row.total_km.is_finite() || !row.cpk.is_finite() {
            warn!(
                brand = %row.brand,
                model = %row.model,
                total_km = row.total_km,
                cpk = row.cpk,
                "Skipping fleet row with non-finite values"
            );
            continue;
        }

        let key = (row.brand.as_str(), row.model.as_str());
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, Vec::new(), Vec::new()));
            groups.len() - 1
        });

        groups[slot].1.push(row.total_km);
        groups[slot].2.push(row.cpk);
    }

    let mut ranking: Vec<BrandRanking> = groups
        .into_iter()
        .map(|((brand, model), km, cpk)| BrandRanking {
            brand: brand.to_string(),
            model: model.to_string(),
            mean_total_km: mean(&km),
            mean_cpk: mean(&cpk),
        })
        .collect();

    ranking.sort_by(|a, b| a.mean_cpk.total_cmp(&b.mean_cpk));
    ranking
}

/// Extracts benchmarking rows from the tires that produced full metrics.
///
/// The projected lifetime distance stands in for the accumulated distance.
pub fn fleet_rows(reports: &[TireReport]) -> Vec<FleetPerformanceRow> {
    reports
        .iter()
        .filter_map(|report| {
            let stats = report.metrics.stats()?;
            Some(FleetPerformanceRow {
                brand: report.brand.clone(),
                model: report.model.clone(),
                total_km: stats.total_estimated_km,
                cpk: stats.cpk,
            })
        })
        .collect()
}
