//! Classification of a candidate amount against a reference range

use super::range::ReferenceRange;
use crate::types::{Action, RiskVerdict};

pub const STATUS_HIGH: i32 = 11;
pub const STATUS_MEDIUM: i32 = 2;
pub const STATUS_LOW: i32 = 1;
pub const STATUS_SAFE: i32 = 0;
pub const STATUS_INCONCLUSIVE: i32 = -1;

/// Maps an amount onto the risk buckets carved out by a reference range.
///
/// Rules, first match wins:
///
/// | amount                  | status | action  |
/// |-------------------------|--------|---------|
/// | `> high`                | 11     | report  |
/// | `> mid` (so `<= high`)  | 2      | monitor |
/// | `< low`                 | 1      | monitor |
/// | `low ..= mid`           | 0      | process |
///
/// Every real amount lands in exactly one bucket. `NaN` is not an amount and
/// is sent to review.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskEvaluator;

impl RiskEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, range: &ReferenceRange, amount: f64) -> RiskVerdict {
        if amount.is_nan() {
            return RiskVerdict::new(
                STATUS_INCONCLUSIVE,
                "Evaluation not conclusive",
                Action::Review,
            );
        }

        if amount > range.high {
            RiskVerdict::new(
                STATUS_HIGH,
                "Unusual amount discovered with high rating",
                Action::Report,
            )
        } else if amount > range.mid {
            RiskVerdict::new(
                STATUS_MEDIUM,
                "Unusual amount discovered with medium rating",
                Action::Monitor,
            )
        } else if amount < range.low {
            RiskVerdict::new(
                STATUS_LOW,
                "Unusual amount discovered with low rating",
                Action::Monitor,
            )
        } else {
            RiskVerdict::new(STATUS_SAFE, "Safe transaction", Action::Process)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn range(low: f64, mid: f64, high: f64) -> ReferenceRange {
        ReferenceRange::new(low, mid, high).unwrap()
    }

    fn status(range: &ReferenceRange, amount: f64) -> (i32, Action) {
        let verdict = RiskEvaluator::new().evaluate(range, amount);
        (verdict.status_code, verdict.action)
    }

    #[test]
    fn test_reference_examples() {
        let r = range(10.0, 50.0, 200.0);

        assert_eq!(status(&r, 5.0), (1, Action::Monitor));
        assert_eq!(status(&r, 30.0), (0, Action::Process));
        assert_eq!(status(&r, 100.0), (2, Action::Monitor));
        assert_eq!(status(&r, 500.0), (11, Action::Report));
    }

    #[test]
    fn test_boundaries() {
        let r = range(10.0, 50.0, 200.0);

        assert_eq!(status(&r, 10.0), (0, Action::Process));
        assert_eq!(status(&r, 50.0), (0, Action::Process));
        assert_eq!(status(&r, 200.0), (2, Action::Monitor));
        assert_eq!(status(&r, 200.000001), (11, Action::Report));
        assert_eq!(status(&r, 9.999999), (1, Action::Monitor));
    }

    #[test]
    fn test_collapsed_ranges() {
        let point = range(75.0, 75.0, 75.0);
        assert_eq!(status(&point, 75.0), (0, Action::Process));
        assert_eq!(status(&point, 74.0), (1, Action::Monitor));
        assert_eq!(status(&point, 76.0), (11, Action::Report));

        let low_mid = range(20.0, 20.0, 90.0);
        assert_eq!(status(&low_mid, 20.0), (0, Action::Process));
        assert_eq!(status(&low_mid, 90.0), (2, Action::Monitor));

        let mid_high = range(20.0, 90.0, 90.0);
        assert_eq!(status(&mid_high, 90.0), (0, Action::Process));
        assert_eq!(status(&mid_high, 90.5), (11, Action::Report));
    }

    #[test]
    fn test_infinite_amounts() {
        let r = range(10.0, 50.0, 200.0);
        assert_eq!(status(&r, f64::INFINITY), (11, Action::Report));
        assert_eq!(status(&r, f64::NEG_INFINITY), (1, Action::Monitor));
    }

    #[test]
    fn test_nan_goes_to_review() {
        let r = range(10.0, 50.0, 200.0);
        assert_eq!(status(&r, f64::NAN), (-1, Action::Review));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let r = range(10.0, 50.0, 200.0);
        let evaluator = RiskEvaluator::new();
        assert_eq!(evaluator.evaluate(&r, 123.0), evaluator.evaluate(&r, 123.0));
    }

    fn ordered_range() -> impl Strategy<Value = ReferenceRange> {
        prop::collection::vec(-1.0e6..1.0e6f64, 3).prop_map(|mut bounds| {
            bounds.sort_by(|a, b| a.total_cmp(b));
            ReferenceRange::new(bounds[0], bounds[1], bounds[2]).unwrap()
        })
    }

    proptest! {
        #[test]
        fn prop_every_real_amount_is_classified(r in ordered_range(), amount in -2.0e6..2.0e6f64) {
            let verdict = RiskEvaluator::new().evaluate(&r, amount);

            let expected = if amount > r.high {
                STATUS_HIGH
            } else if amount > r.mid {
                STATUS_MEDIUM
            } else if amount < r.low {
                STATUS_LOW
            } else {
                prop_assert!(r.low <= amount && amount <= r.mid);
                STATUS_SAFE
            };
            prop_assert_eq!(verdict.status_code, expected);
            prop_assert_ne!(verdict.action, Action::Review);
        }

        #[test]
        fn prop_boundaries_are_classified(r in ordered_range()) {
            for amount in [r.low, r.mid, r.high] {
                let verdict = RiskEvaluator::new().evaluate(&r, amount);
                prop_assert_ne!(verdict.status_code, STATUS_INCONCLUSIVE);
            }
        }
    }
}
