use crate::config::WearPolicy;
use crate::prediction::types::Urgency;

/// Converts a current tread depth (mm) into a replacement urgency.
///
/// With the default policy:
///
/// | Tread        | Urgency   |
/// |--------------|-----------|
/// | < 2.0        | Critical  |
/// | < 3.0        | Urgent    |
/// | < 5.0        | Attention |
/// | >= 5.0       | Ok        |
pub fn classify(tread_mm: f64, policy: &WearPolicy) -> Urgency {
    match tread_mm {
        t if t < policy.critical_below_mm => Urgency::Critical,
        t if t < policy.urgent_below_mm => Urgency::Urgent,
        t if t < policy.attention_below_mm => Urgency::Attention,
        _ => Urgency::Ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_boundaries() {
        let policy = WearPolicy::default();
        assert_eq!(classify(0.0, &policy), Urgency::Critical);
        assert_eq!(classify(1.99, &policy), Urgency::Critical);
        assert_eq!(classify(2.0, &policy), Urgency::Urgent);
        assert_eq!(classify(2.99, &policy), Urgency::Urgent);
        assert_eq!(classify(3.0, &policy), Urgency::Attention);
        assert_eq!(classify(4.99, &policy), Urgency::Attention);
        assert_eq!(classify(5.0, &policy), Urgency::Ok);
        assert_eq!(classify(18.0, &policy), Urgency::Ok);
    }

    #[test]
    fn test_urgency_labels() {
        assert_eq!(Urgency::Critical.to_string(), "CRITICAL");
        assert_eq!(
            serde_json::to_value(Urgency::Attention).unwrap(),
            "ATTENTION"
        );
    }
}
