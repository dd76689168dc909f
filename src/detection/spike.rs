//! Sequential spike detection over a historical amount series.
//!
//! Each observation is scored against a trailing window of the observations
//! that precede it. The score is a two-sided significance: the window's
//! absolute deviations from its median form an empirical distribution, and
//! the current deviation is ranked against it with a Gaussian kernel so the
//! rank interpolates between window points instead of stepping.
//!
//! ```text
//! m   = median(window)
//! d_i = |x_i - m|               for x_i in window
//! d   = |v - m|
//! h   = max(1.06 * std(d_i) * n^(-1/5), floor)
//! p   = (1/n) * sum_i (1 - Phi((d - d_i) / h))
//! ```
//!
//! Once the window is full the bandwidth floor is the window's own scaled
//! MAD, so detection depends only on the spread of recent amounts and not
//! on their level. While the window is still filling there is too little
//! data to estimate spread; the floor is then `0.1 * max(|m|, 1)`, which
//! tolerates ordinary jitter over the first few observations.
//!
//! An observation is a spike iff `p < alpha / 2` with
//! `alpha = 1 - confidence / 100`.

use super::stats::{mean_std, median, normal_cdf};
use crate::error::{EngineError, Result};
use crate::types::HistorySeries;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Trailing window length used by the original deployment (document size 36 / 4)
pub const DEFAULT_WINDOW_SIZE: usize = 9;

/// Confidence level used by the original deployment
pub const DEFAULT_CONFIDENCE_PERCENT: f64 = 95.0;

/// Bandwidth floor for a partial window, as a fraction of the median's magnitude
const WARMUP_RELATIVE_BANDWIDTH: f64 = 0.1;

/// Scales the MAD to a standard deviation under normality
const MAD_SCALE: f64 = 1.4826;

/// Per-observation detection result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeVerdict {
    /// Position of the observation in the series
    pub position: usize,
    pub is_anomaly: bool,
    /// Raw observation value, in the same units as the input amounts
    pub magnitude: f64,
    /// Two-sided significance in [0, 1]; lower means more extreme
    pub significance: f64,
}

/// Causal sliding-window spike detector.
///
/// Holds only its tunables, so a single detector can serve concurrent
/// requests.
#[derive(Debug, Clone)]
pub struct SpikeDetector {
    window_size: usize,
    confidence_percent: f64,
}

impl SpikeDetector {
    /// Create a detector, validating the tunables
    pub fn new(window_size: usize, confidence_percent: f64) -> Result<Self> {
        if window_size == 0 {
            return Err(EngineError::invalid("window size must be positive"));
        }
        if !confidence_percent.is_finite() || confidence_percent <= 0.0 || confidence_percent >= 100.0
        {
            return Err(EngineError::invalid(format!(
                "confidence percent must be in (0, 100), got {}",
                confidence_percent
            )));
        }

        Ok(Self {
            window_size,
            confidence_percent,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn confidence_percent(&self) -> f64 {
        self.confidence_percent
    }

    /// Significance level implied by the confidence
    pub fn alpha(&self) -> f64 {
        1.0 - self.confidence_percent / 100.0
    }

    /// Two-tailed cutoff: significance strictly below this is a spike
    pub fn threshold(&self) -> f64 {
        self.alpha() / 2.0
    }

    /// Score every observation of `series`, in order.
    pub fn detect(&self, series: &HistorySeries) -> Vec<SpikeVerdict> {
        let threshold = self.threshold();
        let mut window: VecDeque<f64> = VecDeque::with_capacity(self.window_size);
        let mut verdicts = Vec::with_capacity(series.len());

        for observation in series.observations() {
            let value = observation.amount;
            let full = window.len() >= self.window_size;
            let significance = significance(window.make_contiguous(), value, full);
            let is_anomaly = significance < threshold;

            trace!(
                position = observation.position,
                magnitude = value,
                significance = significance,
                is_anomaly = is_anomaly,
                "Observation scored"
            );
            if is_anomaly {
                debug!(
                    position = observation.position,
                    magnitude = value,
                    significance = significance,
                    "Spike detected"
                );
            }

            verdicts.push(SpikeVerdict {
                position: observation.position,
                is_anomaly,
                magnitude: value,
                significance,
            });

            window.push_back(value);
            if window.len() > self.window_size {
                window.pop_front();
            }
        }

        verdicts
    }
}

impl Default for SpikeDetector {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            confidence_percent: DEFAULT_CONFIDENCE_PERCENT,
        }
    }
}

/// Validate the tunables and run one detection pass
pub fn detect(
    series: &HistorySeries,
    window_size: usize,
    confidence_percent: f64,
) -> Result<Vec<SpikeVerdict>> {
    Ok(SpikeDetector::new(window_size, confidence_percent)?.detect(series))
}

/// Kernel-smoothed upper-tail rank of `value`'s deviation within `window`.
/// An empty window carries no evidence, so the value is unremarkable.
fn significance(window: &[f64], value: f64, full: bool) -> f64 {
    if window.is_empty() {
        return 1.0;
    }

    let center = median(window);
    let deviations: Vec<f64> = window.iter().map(|x| (x - center).abs()).collect();
    let deviation = (value - center).abs();

    let n = deviations.len() as f64;
    let (_, spread) = mean_std(&deviations);
    let silverman = 1.06 * spread * n.powf(-0.2);
    let floor = if full {
        let mad = median(&deviations) * MAD_SCALE;
        mad.max(f64::EPSILON * center.abs().max(1.0))
    } else {
        WARMUP_RELATIVE_BANDWIDTH * center.abs().max(1.0)
    };
    let bandwidth = silverman.max(floor);

    let tail: f64 = deviations
        .iter()
        .map(|d_i| 1.0 - normal_cdf((deviation - d_i) / bandwidth))
        .sum();

    (tail / n).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn series(values: &[f64]) -> HistorySeries {
        HistorySeries::from_amounts(values.iter().copied())
    }

    #[test]
    fn test_isolated_spike_is_flagged() {
        let history = series(&[10.0, 10.0, 11.0, 9.0, 10.0, 500.0, 10.0, 11.0, 9.0, 10.0]);

        let verdicts = detect(&history, 4, 95.0).unwrap();

        let flagged: Vec<usize> = verdicts
            .iter()
            .filter(|v| v.is_anomaly)
            .map(|v| v.position)
            .collect();
        assert_eq!(flagged, vec![5]);
        assert_eq!(verdicts[5].magnitude, 500.0);
    }

    #[test]
    fn test_unusually_low_value_is_flagged() {
        let history = series(&[100.0, 101.0, 99.0, 100.0, 102.0, 98.0, 100.0, 1.0]);

        let verdicts = detect(&history, 6, 95.0).unwrap();

        assert!(verdicts[7].is_anomaly);
        assert!(verdicts[..7].iter().all(|v| !v.is_anomaly));
    }

    #[test]
    fn test_spike_flagged_at_any_amount_level() {
        let base = [10.0, 10.0, 11.0, 9.0, 10.0, 500.0, 10.0, 11.0, 9.0, 10.0];

        for offset in [0.0, 10_000.0, 1.0e6, -1.0e6] {
            let shifted: Vec<f64> = base.iter().map(|v| v + offset).collect();
            let verdicts = detect(&series(&shifted), 4, 95.0).unwrap();

            let flagged: Vec<usize> = verdicts
                .iter()
                .filter(|v| v.is_anomaly)
                .map(|v| v.position)
                .collect();
            assert_eq!(flagged, vec![5], "offset {offset}");
        }
    }

    #[test]
    fn test_modest_jump_over_tight_large_amounts() {
        let history = series(&[2000.0, 2010.0, 1990.0, 2000.0, 2005.0, 1995.0, 2000.0, 2250.0]);

        let verdicts = detect(&history, 6, 95.0).unwrap();

        assert!(verdicts[7].is_anomaly);
        assert!(verdicts[..7].iter().all(|v| !v.is_anomaly));
    }

    #[test]
    fn test_extreme_amounts_stay_in_range() {
        let history = series(&[f64::MAX; 5]);

        let verdicts = detect(&history, 2, 95.0).unwrap();

        for verdict in &verdicts {
            assert!((0.0..=1.0).contains(&verdict.significance));
            assert!(!verdict.is_anomaly);
        }
    }

    #[test]
    fn test_magnitude_is_raw_value() {
        let history = series(&[3.5, 7.25, 1000.0]);
        let verdicts = SpikeDetector::default().detect(&history);

        let magnitudes: Vec<f64> = verdicts.iter().map(|v| v.magnitude).collect();
        assert_eq!(magnitudes, vec![3.5, 7.25, 1000.0]);
    }

    #[test]
    fn test_first_observation_is_not_significant() {
        let verdicts = detect(&series(&[42.0]), 9, 95.0).unwrap();

        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].significance, 1.0);
        assert!(!verdicts[0].is_anomaly);
    }

    #[test]
    fn test_empty_series() {
        let verdicts = detect(&HistorySeries::default(), 9, 95.0).unwrap();
        assert!(verdicts.is_empty());
    }

    #[test]
    fn test_series_shorter_than_window() {
        let verdicts = detect(&series(&[5.0, 6.0, 5.0]), 9, 95.0).unwrap();
        assert_eq!(verdicts.len(), 3);
    }

    #[test]
    fn test_invalid_tunables() {
        assert!(matches!(
            SpikeDetector::new(0, 95.0),
            Err(EngineError::InvalidInput(_))
        ));
        for confidence in [0.0, 100.0, -5.0, 150.0, f64::NAN] {
            assert!(matches!(
                SpikeDetector::new(9, confidence),
                Err(EngineError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_threshold() {
        let detector = SpikeDetector::new(9, 95.0).unwrap();
        assert!((detector.alpha() - 0.05).abs() < 1e-12);
        assert!((detector.threshold() - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_detector_has_no_memory_between_calls() {
        let detector = SpikeDetector::new(4, 95.0).unwrap();
        let history = series(&[10.0, 10.0, 11.0, 9.0, 10.0, 500.0, 10.0]);

        let first = detector.detect(&history);
        let second = detector.detect(&history);
        assert_eq!(first, second);
    }

    fn amounts() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(-1.0e6..1.0e6f64, 0..64)
    }

    proptest! {
        #[test]
        fn prop_one_verdict_per_observation(values in amounts(), window in 1usize..16) {
            let verdicts = detect(&series(&values), window, 95.0).unwrap();

            prop_assert_eq!(verdicts.len(), values.len());
            for (i, verdict) in verdicts.iter().enumerate() {
                prop_assert_eq!(verdict.position, i);
                prop_assert_eq!(verdict.magnitude, values[i]);
                prop_assert!((0.0..=1.0).contains(&verdict.significance));
            }
        }

        #[test]
        fn prop_verdicts_are_causal(
            values in amounts(),
            tail in prop::collection::vec(-1.0e6..1.0e6f64, 1..16),
            window in 1usize..16,
            cut in 0usize..64,
        ) {
            let cut = cut.min(values.len());
            let mut changed = values[..cut].to_vec();
            changed.extend(tail);

            let original = detect(&series(&values), window, 95.0).unwrap();
            let altered = detect(&series(&changed), window, 95.0).unwrap();

            prop_assert_eq!(&original[..cut], &altered[..cut]);
        }

        #[test]
        fn prop_full_window_flags_ignore_amount_level(
            values in prop::collection::vec(-1_000_000i64..1_000_000, 0..64),
            offset in -1_000_000i64..1_000_000,
            window in 1usize..16,
        ) {
            let plain: Vec<f64> = values.iter().map(|&v| v as f64).collect();
            let shifted: Vec<f64> = values.iter().map(|&v| (v + offset) as f64).collect();

            let original = detect(&series(&plain), window, 95.0).unwrap();
            let moved = detect(&series(&shifted), window, 95.0).unwrap();

            for (a, b) in original.iter().zip(&moved).skip(window) {
                prop_assert_eq!(a.is_anomaly, b.is_anomaly, "position {}", a.position);
            }
        }
    }
}
