use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::normalize::NormalizedBatch;

/// Outcome of polling one line during one collection cycle.
#[derive(Debug, Default, Clone, Serialize)]
pub struct LineSample {
    pub timestamp: DateTime<Utc>,
    pub line: Option<String>,
    pub received: usize,
    pub stored: usize,
    pub dropped: usize,

    // error tracking
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl LineSample {
    pub fn from_batch(timestamp: DateTime<Utc>, received: usize, batch: &NormalizedBatch) -> Self {
        LineSample {
            timestamp,
            received,
            dropped: batch.dropped,
            ..Default::default()
        }
    }

    /// Create an error record with timestamp and error information
    pub fn from_error(timestamp: DateTime<Utc>, error_type: &str, error_message: &str) -> Self {
        LineSample {
            timestamp,
            error_type: Some(error_type.to_string()),
            error_message: Some(error_message.to_string()),
            ..Default::default()
        }
    }

    pub fn with_line(mut self, line: &str) -> Self {
        self.line = Some(line.to_string());
        self
    }

    pub fn with_stored(mut self, stored: usize) -> Self {
        self.stored = stored;
        self
    }

    pub fn is_error(&self) -> bool {
        self.error_type.is_some()
    }
}

/// Totals over every line polled in one cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub lines: usize,
    pub failed_lines: usize,
    pub received: usize,
    pub stored: usize,
    pub dropped: usize,
}

impl CycleSummary {
    pub fn from_samples(samples: &[LineSample]) -> Self {
        samples.iter().fold(Self::default(), |mut acc, s| {
            acc.lines += 1;
            if s.is_error() {
                acc.failed_lines += 1;
            }
            acc.received += s.received;
            acc.stored += s.stored;
            acc.dropped += s.dropped;
            acc
        })
    }
}
