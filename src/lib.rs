//! Fraud Spike Engine Library
//!
//! Scores transaction amounts for fraud risk against a baseline built from
//! spikes in the transaction history.

pub mod config;
pub mod consumer;
pub mod detection;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod metrics;
pub mod producer;
pub mod types;

pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use detection::{Assessment, FraudEngine, RangeSelector, ReferenceRange, RiskEvaluator, SpikeDetector};
pub use error::{EngineError, Result};
pub use history::HistoryLoader;
pub use producer::VerdictProducer;
pub use types::{EvaluationRequest, HistorySeries, RiskVerdict};
