//! Transaction history and evaluation request data structures

use serde::{Deserialize, Serialize};

/// Raw row of the transaction history file.
///
/// Only `amount` feeds the pipeline; `timestamp` is carried as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Transaction amount
    pub amount: f64,

    /// Opaque timestamp text as found in the source
    #[serde(default)]
    pub timestamp: String,
}

/// A single historical amount and its position in the series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub position: usize,
    pub amount: f64,
}

/// Ordered historical amounts, read once per evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySeries {
    observations: Vec<Observation>,
}

impl HistorySeries {
    /// Build a series from amounts in source order
    pub fn from_amounts<I>(amounts: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let observations = amounts
            .into_iter()
            .enumerate()
            .map(|(position, amount)| Observation { position, amount })
            .collect();
        Self { observations }
    }

    /// Build a series from loaded history records, dropping timestamps
    pub fn from_records(records: &[HistoryRecord]) -> Self {
        Self::from_amounts(records.iter().map(|r| r.amount))
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Amounts in series order
    pub fn amounts(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|o| o.amount)
    }
}

/// Incoming request to score a transaction amount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Caller supplied correlation id (generated when absent)
    #[serde(default = "new_request_id")]
    pub request_id: String,

    /// Amount to score
    pub amount: f64,
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl EvaluationRequest {
    pub fn new(amount: f64) -> Self {
        Self {
            request_id: new_request_id(),
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_positions_follow_input_order() {
        let series = HistorySeries::from_amounts([12.0, 7.5, 300.0]);

        assert_eq!(series.len(), 3);
        let positions: Vec<usize> = series.observations().iter().map(|o| o.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(series.amounts().collect::<Vec<_>>(), vec![12.0, 7.5, 300.0]);
    }

    #[test]
    fn test_series_from_records() {
        let records = vec![
            HistoryRecord {
                amount: 10.0,
                timestamp: "2024-01-01T10:00:00".to_string(),
            },
            HistoryRecord {
                amount: 25.0,
                timestamp: String::new(),
            },
        ];

        let series = HistorySeries::from_records(&records);
        assert_eq!(series.amounts().collect::<Vec<_>>(), vec![10.0, 25.0]);
    }

    #[test]
    fn test_record_serializes_with_plain_field_names() {
        let record = HistoryRecord {
            amount: 19.99,
            timestamp: "2024-03-01T09:30:00".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"amount": 19.99, "timestamp": "2024-03-01T09:30:00"}));

        let parsed: HistoryRecord = serde_json::from_str(r#"{"amount": 5.0}"#).unwrap();
        assert_eq!(parsed.timestamp, "");
    }

    #[test]
    fn test_request_id_defaults_when_missing() {
        let request: EvaluationRequest = serde_json::from_str(r#"{"amount": 42.5}"#).unwrap();

        assert_eq!(request.amount, 42.5);
        assert!(!request.request_id.is_empty());
    }
}
