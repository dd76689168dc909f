//! End-to-end scoring of one amount against a transaction history

use super::evaluator::RiskEvaluator;
use super::range::{RangeSelector, ReferenceRange};
use super::spike::{SpikeDetector, SpikeVerdict};
use crate::config::DetectionConfig;
use crate::error::{EngineError, Result};
use crate::types::{HistorySeries, RiskVerdict};
use tracing::{debug, info};

/// Outcome of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub verdict: RiskVerdict,
    /// Baseline the amount was compared against
    pub range: ReferenceRange,
    /// Spikes found in the history
    pub anomaly_count: usize,
    /// Observations in the history
    pub observation_count: usize,
}

/// Runs detect -> select -> evaluate for each request.
///
/// Holds only validated tunables, so one engine is shared across workers.
#[derive(Debug, Clone)]
pub struct FraudEngine {
    detector: SpikeDetector,
    selector: RangeSelector,
    evaluator: RiskEvaluator,
}

impl FraudEngine {
    /// Create an engine from configuration
    pub fn new(config: &DetectionConfig) -> Result<Self> {
        let detector = SpikeDetector::new(config.window_size, config.confidence_percent)?;

        info!(
            window_size = detector.window_size(),
            confidence_percent = detector.confidence_percent(),
            threshold = detector.threshold(),
            "Fraud engine initialized"
        );

        Ok(Self {
            detector,
            selector: RangeSelector::new(),
            evaluator: RiskEvaluator::new(),
        })
    }

    pub fn detector(&self) -> &SpikeDetector {
        &self.detector
    }

    /// Spikes detected in `series`, in series order
    pub fn spikes(&self, series: &HistorySeries) -> Vec<SpikeVerdict> {
        self.detector
            .detect(series)
            .into_iter()
            .filter(|v| v.is_anomaly)
            .collect()
    }

    /// Derive the reference range for `series`.
    ///
    /// Returns the range and the number of spikes it was built from.
    pub fn baseline(&self, series: &HistorySeries) -> Result<(ReferenceRange, usize)> {
        let spikes = self.spikes(series);
        if spikes.is_empty() {
            return Err(EngineError::EmptyAnomalySet {
                observations: series.len(),
            });
        }

        let range = self.selector.select(&spikes)?;
        Ok((range, spikes.len()))
    }

    /// Score `amount` against the baseline derived from `series`
    pub fn evaluate(&self, series: &HistorySeries, amount: f64) -> Result<Assessment> {
        if !amount.is_finite() {
            return Err(EngineError::invalid(format!(
                "amount must be a finite number, got {}",
                amount
            )));
        }

        let (range, anomaly_count) = self.baseline(series)?;
        let verdict = self.evaluator.evaluate(&range, amount);

        debug!(
            amount = amount,
            low = range.low,
            mid = range.mid,
            high = range.high,
            anomaly_count = anomaly_count,
            observations = series.len(),
            status = verdict.status_code,
            action = verdict.action.as_str(),
            "Evaluation complete"
        );

        Ok(Assessment {
            verdict,
            range,
            anomaly_count,
            observation_count: series.len(),
        })
    }
}

impl Default for FraudEngine {
    fn default() -> Self {
        Self {
            detector: SpikeDetector::default(),
            selector: RangeSelector::new(),
            evaluator: RiskEvaluator::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Action;

    fn engine(window_size: usize) -> FraudEngine {
        FraudEngine::new(&DetectionConfig {
            window_size,
            confidence_percent: 95.0,
        })
        .unwrap()
    }

    fn history() -> HistorySeries {
        HistorySeries::from_amounts([
            10.0, 10.0, 11.0, 9.0, 10.0, 500.0, 10.0, 11.0, 9.0, 10.0,
        ])
    }

    #[test]
    fn test_single_spike_baseline() {
        let (range, count) = engine(4).baseline(&history()).unwrap();

        assert_eq!(count, 1);
        assert_eq!(range, ReferenceRange::new(500.0, 500.0, 500.0).unwrap());
    }

    #[test]
    fn test_evaluate_against_history() {
        let engine = engine(4);

        let above = engine.evaluate(&history(), 750.0).unwrap();
        assert_eq!(above.verdict.status_code, 11);
        assert_eq!(above.verdict.action, Action::Report);
        assert_eq!(above.observation_count, 10);

        let below = engine.evaluate(&history(), 120.0).unwrap();
        assert_eq!(below.verdict.status_code, 1);

        let equal = engine.evaluate(&history(), 500.0).unwrap();
        assert_eq!(equal.verdict.status_code, 0);
    }

    #[test]
    fn test_flat_history_has_no_baseline() {
        let flat = HistorySeries::from_amounts([10.0, 10.0, 11.0, 9.0, 10.0, 10.0]);

        let result = engine(4).evaluate(&flat, 50.0);
        assert!(matches!(
            result,
            Err(EngineError::EmptyAnomalySet { observations: 6 })
        ));
    }

    #[test]
    fn test_empty_history_has_no_baseline() {
        let result = engine(4).evaluate(&HistorySeries::default(), 50.0);
        assert!(matches!(
            result,
            Err(EngineError::EmptyAnomalySet { observations: 0 })
        ));
    }

    #[test]
    fn test_non_finite_amount_rejected() {
        let result = engine(4).evaluate(&history(), f64::NAN);
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = FraudEngine::new(&DetectionConfig {
            window_size: 0,
            confidence_percent: 95.0,
        });
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }
}
