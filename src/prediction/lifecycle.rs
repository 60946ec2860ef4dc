use crate::config::WearPolicy;
use crate::prediction::types::{LifecycleForecast, TireSnapshot};
use crate::prediction::urgency::classify;

/// Builds a quick remaining-life forecast from current tire snapshots.
///
/// Unlike [`calculate_tire_metrics`](crate::prediction::metrics::calculate_tire_metrics)
/// this needs no inspection history: the wear rate is the average over the
/// whole distance run so far, and remaining distance is measured down to the
/// legal minimum. Tires are ordered by current tread, thinnest first, and at
/// most `limit` forecasts are returned.
pub fn forecast_lifecycle(
    snapshots: &[TireSnapshot],
    policy: &WearPolicy,
    limit: usize,
) -> Vec<LifecycleForecast> {
    let mut eligible: Vec<&TireSnapshot> = snapshots
        .iter()
        .filter(|s| s.initial_tread_mm > 0.0)
        .collect();
    eligible.sort_by(|a, b| a.current_tread_mm.total_cmp(&b.current_tread_mm));

    eligible
        .into_iter()
        .take(limit)
        .map(|s| forecast_one(s, policy))
        .collect()
}

fn forecast_one(snapshot: &TireSnapshot, policy: &WearPolicy) -> LifecycleForecast {
    let initial = snapshot.initial_tread_mm;
    let current = snapshot.current_tread_mm;

    let life_percent = current / initial * 100.0;

    let remaining_km = if snapshot.km_run > 0.0 && initial > current {
        let wear_per_km = (initial - current) / snapshot.km_run;
        let remaining_tread = current - policy.legal_min_tread_mm;
        Some(((remaining_tread / wear_per_km).trunc() as i64).max(0))
    } else {
        None
    };

    LifecycleForecast {
        tire_id: snapshot.tire_id.clone(),
        serial_number: snapshot.serial_number.clone(),
        brand: snapshot.brand.clone(),
        model: snapshot.model.clone(),
        current_tread_mm: current,
        life_percent,
        remaining_km,
        urgency: classify(current, policy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::types::Urgency;

    fn snapshot(id: &str, initial: f64, current: f64, km_run: f64) -> TireSnapshot {
        TireSnapshot {
            tire_id: id.to_string(),
            serial_number: format!("SN-{id}"),
            brand: "Michelin".to_string(),
            model: "X Multi Z".to_string(),
            initial_tread_mm: initial,
            current_tread_mm: current,
            km_run,
        }
    }

    #[test]
    fn test_empty_snapshots() {
        assert!(forecast_lifecycle(&[], &WearPolicy::default(), 10).is_empty());
    }

    #[test]
    fn test_remaining_km_from_average_wear() {
        // 4 mm over 40 000 km is 10 000 km/mm; 10.4 mm usable above 1.6 mm
        let forecasts =
            forecast_lifecycle(&[snapshot("t1", 16.0, 12.0, 40_000.0)], &WearPolicy::default(), 10);

        assert_eq!(forecasts.len(), 1);
        assert_eq!(forecasts[0].remaining_km, Some(104_000));
        assert_eq!(forecasts[0].life_percent, 75.0);
        assert_eq!(forecasts[0].urgency, Urgency::Ok);
    }

    #[test]
    fn test_no_distance_has_no_remaining_estimate() {
        let forecasts =
            forecast_lifecycle(&[snapshot("t1", 16.0, 16.0, 0.0)], &WearPolicy::default(), 10);
        assert_eq!(forecasts[0].remaining_km, None);
    }

    #[test]
    fn test_below_legal_minimum_floors_at_zero() {
        let forecasts =
            forecast_lifecycle(&[snapshot("t1", 16.0, 1.0, 60_000.0)], &WearPolicy::default(), 10);
        assert_eq!(forecasts[0].remaining_km, Some(0));
        assert_eq!(forecasts[0].urgency, Urgency::Critical);
    }

    #[test]
    fn test_sorted_thinnest_first_and_limited() {
        let snapshots = vec![
            snapshot("a", 16.0, 9.0, 20_000.0),
            snapshot("b", 16.0, 2.5, 70_000.0),
            snapshot("c", 16.0, 4.0, 60_000.0),
            snapshot("d", 0.0, 1.0, 60_000.0),
        ];

        let forecasts = forecast_lifecycle(&snapshots, &WearPolicy::default(), 2);
        let ids: Vec<_> = forecasts.iter().map(|f| f.tire_id.as_str()).collect();

        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(forecasts[0].urgency, Urgency::Urgent);
        assert_eq!(forecasts[1].urgency, Urgency::Attention);
    }
}
