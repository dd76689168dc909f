//! Reduction of detected spikes to a reference range

use super::spike::SpikeVerdict;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Low, mid and high spike magnitudes used as risk bucket boundaries.
///
/// Always satisfies `low <= mid <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl ReferenceRange {
    /// Build a range from explicit bounds
    pub fn new(low: f64, mid: f64, high: f64) -> Result<Self> {
        if !(low.is_finite() && mid.is_finite() && high.is_finite()) {
            return Err(EngineError::invalid(format!(
                "reference range bounds must be finite, got ({}, {}, {})",
                low, mid, high
            )));
        }
        if low > mid || mid > high {
            return Err(EngineError::invalid(format!(
                "reference range must satisfy low <= mid <= high, got ({}, {}, {})",
                low, mid, high
            )));
        }
        Ok(Self { low, mid, high })
    }
}

/// Picks min, max and a positional middle magnitude from a set of spikes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeSelector;

impl RangeSelector {
    pub fn new() -> Self {
        Self
    }

    /// Reduce anomalous verdicts to a reference range.
    ///
    /// The middle value is `sorted[len / 2]`, which for even counts is the
    /// upper of the two central spikes rather than their mean.
    pub fn select(&self, anomalies: &[SpikeVerdict]) -> Result<ReferenceRange> {
        if anomalies.is_empty() {
            return Err(EngineError::EmptyAnomalySet { observations: 0 });
        }

        let mut sorted: Vec<&SpikeVerdict> = anomalies.iter().collect();
        sorted.sort_by(|a, b| a.magnitude.total_cmp(&b.magnitude));

        let low = sorted[0].magnitude;
        let high = sorted[sorted.len() - 1].magnitude;
        let mid = sorted[sorted.len() / 2].magnitude;

        Ok(ReferenceRange { low, mid, high })
    }
}
