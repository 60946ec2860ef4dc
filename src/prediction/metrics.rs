use crate::config::WearPolicy;
use crate::prediction::types::{InspectionSample, TireAttributes, WearMetrics, WearStats};
use chrono::{NaiveDate, TimeDelta, Utc};

/// Computes wear rate, remaining life, CPK and retirement date for one tire,
/// projecting the retirement date from today's UTC date.
///
/// See [`calculate_tire_metrics_on`].
pub fn calculate_tire_metrics(
    history: &[InspectionSample],
    attrs: &TireAttributes,
    policy: &WearPolicy,
) -> WearMetrics {
    calculate_tire_metrics_on(history, attrs, policy, Utc::now().date_naive())
}

/// Computes the wear metrics of one tire as of `today`.
///
/// `history` may arrive in any order; samples are stably sorted by timestamp
/// before use. The baseline comes from `attrs` when present and from the
/// earliest sample otherwise. An empty history yields
/// [`WearMetrics::Insufficient`], and a history without positive wear and
/// positive distance yields [`WearMetrics::AwaitingData`].
pub fn calculate_tire_metrics_on(
    history: &[InspectionSample],
    attrs: &TireAttributes,
    policy: &WearPolicy,
    today: NaiveDate,
) -> WearMetrics {
    if history.is_empty() {
        return WearMetrics::Insufficient {
            message: "No inspections recorded.".to_string(),
        };
    }

    let mut ordered: Vec<&InspectionSample> = history.iter().collect();
    ordered.sort_by_key(|s| s.timestamp);

    let first = ordered[0];
    let last = ordered[ordered.len() - 1];

    let initial_tread = attrs.initial_tread_mm.unwrap_or(first.tread_mm);
    let initial_km = attrs.initial_odometer_km.unwrap_or(first.odometer_km);

    let total_km_run = last.odometer_km - initial_km;
    let total_wear = initial_tread - last.tread_mm;

    if total_wear <= 0.0 || total_km_run <= 0.0 {
        return WearMetrics::AwaitingData {
            km_per_mm: 0.0,
            current_wear_percent: 0.0,
        };
    }

    let km_per_mm = total_km_run / total_wear;

    // Projected end of life
    let remaining_wear = last.tread_mm - policy.min_tread_mm;
    let expected_remaining_km = (remaining_wear * km_per_mm).max(0.0);
    let total_estimated_km = total_km_run + expected_remaining_km;

    let cost = attrs.cost.unwrap_or(0.0);
    let cpk = if total_estimated_km > 0.0 {
        cost / total_estimated_km
    } else {
        0.0
    };

    let usable_tread = initial_tread - policy.min_tread_mm;
    let wear_percent = if usable_tread > 0.0 {
        (total_wear / usable_tread * 100.0).clamp(0.0, 100.0)
    } else {
        100.0
    };

    let avg_monthly_km = attrs
        .avg_monthly_km
        .unwrap_or(policy.default_avg_monthly_km);
    let days_remaining = if avg_monthly_km > 0.0 {
        expected_remaining_km / avg_monthly_km * 30.0
    } else {
        policy.fallback_retirement_days
    };

    WearMetrics::Success {
        stats: WearStats {
            km_per_mm,
            total_km_run,
            total_wear_mm: total_wear,
            total_estimated_km,
            expected_remaining_km,
            cpk,
            wear_percent,
            estimated_retirement_date: add_whole_days(today, days_remaining),
        },
    }
}

/// Adds the whole-day part of `days` to `date`, saturating at the calendar limits.
fn add_whole_days(date: NaiveDate, days: f64) -> NaiveDate {
    let whole = days.trunc() as i64;
    TimeDelta::try_days(whole)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if whole < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap() + Duration::days(n)
    }

    fn sample(n: i64, km: f64, tread: f64) -> InspectionSample {
        InspectionSample {
            timestamp: day(n),
            odometer_km: km,
            tread_mm: tread,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    fn scenario_b_attrs() -> TireAttributes {
        TireAttributes {
            cost: Some(1200.0),
            avg_monthly_km: Some(5000.0),
            ..Default::default()
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_history_is_insufficient() {
        let metrics =
            calculate_tire_metrics_on(&[], &TireAttributes::default(), &WearPolicy::default(), today());
        assert_eq!(metrics.status(), "insufficient");
    }

    #[test]
    fn test_single_sample_is_awaiting_data() {
        let history = vec![sample(0, 0.0, 18.0)];
        let metrics = calculate_tire_metrics_on(
            &history,
            &TireAttributes::default(),
            &WearPolicy::default(),
            today(),
        );
        assert_eq!(
            metrics,
            WearMetrics::AwaitingData {
                km_per_mm: 0.0,
                current_wear_percent: 0.0
            }
        );
    }

    #[test]
    fn test_tread_increase_is_awaiting_data() {
        let history = vec![sample(0, 0.0, 12.0), sample(30, 4000.0, 12.5)];
        let metrics = calculate_tire_metrics_on(
            &history,
            &TireAttributes::default(),
            &WearPolicy::default(),
            today(),
        );
        assert_eq!(metrics.status(), "awaiting_data");
    }

    #[test]
    fn test_no_distance_is_awaiting_data() {
        let history = vec![sample(0, 10_000.0, 18.0), sample(30, 10_000.0, 16.0)];
        let metrics = calculate_tire_metrics_on(
            &history,
            &TireAttributes::default(),
            &WearPolicy::default(),
            today(),
        );
        assert_eq!(metrics.status(), "awaiting_data");
    }

    #[test]
    fn test_scenario_b() {
        let history = vec![sample(0, 0.0, 18.0), sample(180, 30_000.0, 12.0)];
        let metrics = calculate_tire_metrics_on(
            &history,
            &scenario_b_attrs(),
            &WearPolicy::default(),
            today(),
        );

        let stats = metrics.stats().expect("expected success");
        assert!(approx(stats.total_km_run, 30_000.0));
        assert!(approx(stats.total_wear_mm, 6.0));
        assert!(approx(stats.km_per_mm, 5000.0));
        assert!(approx(stats.expected_remaining_km, 45_000.0));
        assert!(approx(stats.total_estimated_km, 75_000.0));
        assert!(approx(stats.cpk, 0.016));
        assert!(approx(stats.wear_percent, 40.0));
        // 45 000 km at 5 000 km/month is 270 days
        assert_eq!(
            stats.estimated_retirement_date,
            today() + Duration::days(270)
        );
    }

    #[test]
    fn test_rate_is_exact_and_lifetime_covers_distance_run() {
        let history = vec![
            sample(0, 1_000.0, 17.3),
            sample(40, 7_777.0, 15.9),
            sample(95, 19_123.0, 13.7),
        ];
        let metrics = calculate_tire_metrics_on(
            &history,
            &TireAttributes::default(),
            &WearPolicy::default(),
            today(),
        );

        let stats = metrics.stats().expect("expected success");
        assert_eq!(stats.km_per_mm, (19_123.0 - 1_000.0) / (17.3 - 13.7));
        assert!(stats.total_estimated_km >= stats.total_km_run);
    }

    #[test]
    fn test_order_independence() {
        let sorted = vec![
            sample(0, 0.0, 18.0),
            sample(60, 9_000.0, 16.1),
            sample(180, 30_000.0, 12.0),
        ];
        let shuffled = vec![sorted[2].clone(), sorted[0].clone(), sorted[1].clone()];

        let policy = WearPolicy::default();
        let a = calculate_tire_metrics_on(&sorted, &scenario_b_attrs(), &policy, today());
        let b = calculate_tire_metrics_on(&shuffled, &scenario_b_attrs(), &policy, today());
        assert_eq!(a, b);
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let policy = WearPolicy::default();
        let attrs = TireAttributes::default();

        // Two readings taken at the same moment: the later one in input order is current.
        let history = vec![
            sample(0, 0.0, 18.0),
            sample(100, 10_000.0, 15.0),
            sample(100, 10_000.0, 14.0),
        ];
        let stats = calculate_tire_metrics_on(&history, &attrs, &policy, today())
            .stats()
            .cloned()
            .expect("expected success");
        assert!(approx(stats.total_wear_mm, 4.0));
        assert!(approx(stats.km_per_mm, 2_500.0));

        let swapped = vec![
            sample(100, 10_000.0, 14.0),
            sample(0, 0.0, 18.0),
            sample(100, 10_000.0, 15.0),
        ];
        let stats = calculate_tire_metrics_on(&swapped, &attrs, &policy, today())
            .stats()
            .cloned()
            .expect("expected success");
        assert!(approx(stats.total_wear_mm, 3.0));
        assert!(approx(stats.km_per_mm, 10_000.0 / 3.0));
    }

    #[test]
    fn test_idempotence() {
        let history = vec![sample(180, 30_000.0, 12.0), sample(0, 0.0, 18.0)];
        let before = history.clone();
        let policy = WearPolicy::default();

        let a = calculate_tire_metrics_on(&history, &scenario_b_attrs(), &policy, today());
        let b = calculate_tire_metrics_on(&history, &scenario_b_attrs(), &policy, today());
        assert_eq!(a, b);
        assert_eq!(history, before);
    }

    #[test]
    fn test_attributes_override_baseline() {
        let history = vec![sample(30, 20_000.0, 14.0)];
        let attrs = TireAttributes {
            initial_tread_mm: Some(18.0),
            initial_odometer_km: Some(10_000.0),
            ..Default::default()
        };
        let metrics =
            calculate_tire_metrics_on(&history, &attrs, &WearPolicy::default(), today());

        let stats = metrics.stats().expect("expected success");
        assert!(approx(stats.km_per_mm, 2500.0));
        assert_eq!(stats.cpk, 0.0);
    }

    #[test]
    fn test_tread_below_minimum_clamps() {
        let history = vec![sample(0, 0.0, 10.0), sample(200, 40_000.0, 2.0)];
        let metrics = calculate_tire_metrics_on(
            &history,
            &TireAttributes::default(),
            &WearPolicy::default(),
            today(),
        );

        let stats = metrics.stats().expect("expected success");
        assert_eq!(stats.expected_remaining_km, 0.0);
        assert!(approx(stats.total_estimated_km, 40_000.0));
        assert_eq!(stats.wear_percent, 100.0);
        assert_eq!(stats.estimated_retirement_date, today());
    }

    #[test]
    fn test_initial_tread_at_minimum_reports_full_wear() {
        let history = vec![sample(10, 5_000.0, 2.5)];
        let attrs = TireAttributes {
            initial_tread_mm: Some(3.0),
            initial_odometer_km: Some(0.0),
            ..Default::default()
        };
        let metrics =
            calculate_tire_metrics_on(&history, &attrs, &WearPolicy::default(), today());
        assert_eq!(metrics.stats().unwrap().wear_percent, 100.0);
    }

    #[test]
    fn test_zero_monthly_distance_uses_fallback() {
        let history = vec![sample(0, 0.0, 18.0), sample(180, 30_000.0, 12.0)];
        let attrs = TireAttributes {
            avg_monthly_km: Some(0.0),
            ..Default::default()
        };
        let metrics =
            calculate_tire_metrics_on(&history, &attrs, &WearPolicy::default(), today());
        assert_eq!(
            metrics.stats().unwrap().estimated_retirement_date,
            today() + Duration::days(365)
        );
    }

    #[test]
    fn test_custom_minimum_tread() {
        let history = vec![sample(0, 0.0, 18.0), sample(180, 30_000.0, 12.0)];
        let policy = WearPolicy {
            min_tread_mm: 1.6,
            ..Default::default()
        };
        let metrics = calculate_tire_metrics_on(&history, &scenario_b_attrs(), &policy, today());
        let stats = metrics.stats().unwrap();
        assert!(approx(stats.expected_remaining_km, (12.0 - 1.6) * 5000.0));
    }

    #[test]
    fn test_serialized_values_are_rounded() {
        let history = vec![sample(0, 0.0, 18.0), sample(100, 10_000.0, 15.0)];
        let attrs = TireAttributes {
            cost: Some(999.0),
            ..Default::default()
        };
        let metrics =
            calculate_tire_metrics_on(&history, &attrs, &WearPolicy::default(), today());
        let json = serde_json::to_value(&metrics).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["stats"]["km_per_mm"], 3333.33);
        assert_eq!(json["stats"]["expected_remaining_km"], 40_000.0);
        assert_eq!(json["stats"]["cpk"], 0.02);
        assert_eq!(json["stats"]["wear_percent"], 20.0);
        assert_eq!(json["stats"]["estimated_retirement_date"], "2025-02-26");

        // Rounding stays out of the in-memory value
        assert!(metrics.stats().unwrap().km_per_mm > 3333.33);
    }
}
