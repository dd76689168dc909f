//! Anomaly-baseline pipeline: spike detection, range selection, risk evaluation

pub mod engine;
pub mod evaluator;
pub mod range;
pub mod spike;
mod stats;

pub use engine::{Assessment, FraudEngine};
pub use evaluator::RiskEvaluator;
pub use range::{RangeSelector, ReferenceRange};
pub use spike::{detect, SpikeDetector, SpikeVerdict};
