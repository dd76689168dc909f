//! Type definitions for the fraud spike engine

pub mod transaction;
pub mod verdict;

pub use transaction::{EvaluationRequest, HistoryRecord, HistorySeries, Observation};
pub use verdict::{Action, EvaluationFailure, EvaluationResponse, RiskVerdict};
