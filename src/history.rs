//! CSV transaction history loader

use crate::config::HistoryConfig;
use crate::error::{EngineError, Result};
use crate::types::{HistoryRecord, HistorySeries};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Reads amount/timestamp columns from a delimited history file.
#[derive(Debug, Clone)]
pub struct HistoryLoader {
    has_headers: bool,
    amount_column: usize,
    timestamp_column: usize,
}

impl HistoryLoader {
    /// Loader for the default layout: header row, amount in column 4,
    /// timestamp in column 5
    pub fn new() -> Self {
        Self {
            has_headers: true,
            amount_column: 4,
            timestamp_column: 5,
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self {
            has_headers: config.has_headers,
            amount_column: config.amount_column,
            timestamp_column: config.timestamp_column,
        }
    }

    pub fn with_columns(mut self, amount_column: usize, timestamp_column: usize) -> Self {
        self.amount_column = amount_column;
        self.timestamp_column = timestamp_column;
        self
    }

    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Load history records from a file
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<HistoryRecord>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| EngineError::HistoryIo {
            path: path.display().to_string(),
            source,
        })?;

        let records = self.load_reader(file)?;
        info!(
            path = %path.display(),
            records = records.len(),
            "Transaction history loaded"
        );
        Ok(records)
    }

    /// Load history records from any reader
    pub fn load_reader<R: Read>(&self, reader: R) -> Result<Vec<HistoryRecord>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(self.has_headers)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (index, row) in csv_reader.records().enumerate() {
            let fallback_row = index + 1 + usize::from(self.has_headers);
            let row = row.map_err(|e| EngineError::MalformedHistory {
                row: e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_row),
                reason: e.to_string(),
            })?;
            let line = row
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(fallback_row);

            records.push(self.parse_row(&row, line)?);
        }

        debug!(records = records.len(), "Parsed history rows");
        Ok(records)
    }

    /// Load a file straight into a series
    pub fn load_series<P: AsRef<Path>>(&self, path: P) -> Result<HistorySeries> {
        let records = self.load_path(path)?;
        Ok(HistorySeries::from_records(&records))
    }

    fn parse_row(&self, row: &csv::StringRecord, line: usize) -> Result<HistoryRecord> {
        let raw = row
            .get(self.amount_column)
            .ok_or_else(|| EngineError::MalformedHistory {
                row: line,
                reason: format!(
                    "missing amount column {} ({} columns present)",
                    self.amount_column,
                    row.len()
                ),
            })?;

        let amount: f64 = raw.parse().map_err(|_| EngineError::MalformedHistory {
            row: line,
            reason: format!("amount '{}' is not a number", raw),
        })?;
        if !amount.is_finite() {
            return Err(EngineError::MalformedHistory {
                row: line,
                reason: format!("amount '{}' is not finite", raw),
            });
        }

        let timestamp = row
            .get(self.timestamp_column)
            .unwrap_or_default()
            .to_string();

        Ok(HistoryRecord { amount, timestamp })
    }
}

impl Default for HistoryLoader {
    fn default() -> Self {
        Self::new()
    }
}
