//! Error taxonomy for the anomaly-baseline pipeline

use thiserror::Error;

/// Errors raised while building a baseline or evaluating an amount.
///
/// Every variant is scoped to a single evaluation request. Nothing here is
/// retried: the pipeline is deterministic, so the same input fails the same way.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A tunable or request parameter is out of range
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The history produced no spikes, so no reference range exists
    #[error("no anomalies detected in {observations} historical observations")]
    EmptyAnomalySet { observations: usize },

    /// A history record could not be turned into an observation
    #[error("malformed history at row {row}: {reason}")]
    MalformedHistory { row: usize, reason: String },

    /// The history source could not be read at all
    #[error("failed to read history from {path}: {source}")]
    HistoryIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        EngineError::InvalidInput(reason.into())
    }

    /// Stable label used in failure responses and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidInput(_) => "invalid_input",
            EngineError::EmptyAnomalySet { .. } => "empty_anomaly_set",
            EngineError::MalformedHistory { .. } | EngineError::HistoryIo { .. } => {
                "malformed_history"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(EngineError::invalid("x").kind(), "invalid_input");
        assert_eq!(
            EngineError::EmptyAnomalySet { observations: 3 }.kind(),
            "empty_anomaly_set"
        );
        let io = EngineError::HistoryIo {
            path: "missing.csv".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(io.kind(), "malformed_history");
    }

    #[test]
    fn test_error_messages() {
        let err = EngineError::MalformedHistory {
            row: 7,
            reason: "amount 'abc' is not a number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed history at row 7: amount 'abc' is not a number"
        );
    }
}
