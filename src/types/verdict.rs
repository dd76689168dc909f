//! Risk verdict and evaluation response data structures

use crate::detection::{Assessment, ReferenceRange};
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operational instruction attached to a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Process,
    Monitor,
    Report,
    Review,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Process => "process",
            Action::Monitor => "monitor",
            Action::Report => "report",
            Action::Review => "review",
        }
    }
}

/// Discrete risk classification for one amount.
///
/// Serialized with the short field names callers already consume:
/// `{"status": 11, "reason": "...", "action": "report"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskVerdict {
    #[serde(rename = "status")]
    pub status_code: i32,

    #[serde(rename = "reason")]
    pub reason_text: String,

    pub action: Action,
}

impl RiskVerdict {
    pub fn new(status_code: i32, reason_text: impl Into<String>, action: Action) -> Self {
        Self {
            status_code,
            reason_text: reason_text.into(),
            action,
        }
    }
}

/// Response published for a successfully scored request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResponse {
    /// Unique response identifier
    pub response_id: String,

    /// Correlation id of the request
    pub request_id: String,

    /// Amount that was scored
    pub amount: f64,

    pub verdict: RiskVerdict,

    /// Baseline the amount was compared against
    pub reference_range: ReferenceRange,

    /// Spikes found in the history
    pub anomaly_count: usize,

    /// Observations in the history
    pub observation_count: usize,

    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationResponse {
    pub fn new(request_id: String, amount: f64, assessment: &Assessment) -> Self {
        Self {
            response_id: uuid::Uuid::new_v4().to_string(),
            request_id,
            amount,
            verdict: assessment.verdict.clone(),
            reference_range: assessment.range,
            anomaly_count: assessment.anomaly_count,
            observation_count: assessment.observation_count,
            evaluated_at: Utc::now(),
        }
    }
}

/// Response published when a request could not be scored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationFailure {
    pub request_id: String,
    pub kind: String,
    pub error: String,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationFailure {
    pub fn new(request_id: String, error: &EngineError) -> Self {
        Self {
            request_id,
            kind: error.kind().to_string(),
            error: error.to_string(),
            evaluated_at: Utc::now(),
        }
    }

    /// Failure raised outside the engine, e.g. a timeout at the boundary
    pub fn with_kind(request_id: String, kind: &str, error: impl Into<String>) -> Self {
        Self {
            request_id,
            kind: kind.to_string(),
            error: error.into(),
            evaluated_at: Utc::now(),
        }
    }

    /// Failure for a payload that did not parse; no request id is known
    pub fn malformed_request(error: impl Into<String>) -> Self {
        Self::with_kind(String::new(), "malformed_request", error)
    }
}
