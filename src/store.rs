//! Durable, append-only log of observations.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::observation::Observation;
use crate::output::append_records;

/// Append-only observation log, readable by recency.
pub trait ObservationStore {
    /// Appends observations and returns how many were stored.
    fn append(&self, observations: &[Observation]) -> Result<usize>;

    /// Returns at most `limit` observations, newest first.
    fn fetch_recent(&self, limit: usize) -> Result<Vec<Observation>>;
}

/// [`ObservationStore`] backed by a single CSV file.
///
/// Rows are only ever appended; nothing rewrites or truncates the file.
#[derive(Debug, Clone)]
pub struct CsvObservationStore {
    path: PathBuf,
}

impl CsvObservationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ObservationStore for CsvObservationStore {
    fn append(&self, observations: &[Observation]) -> Result<usize> {
        if observations.is_empty() {
            return Ok(0);
        }
        append_records(&self.path, observations)
            .with_context(|| format!("failed to append to {}", self.path.display()))
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn fetch_recent(&self, limit: usize) -> Result<Vec<Observation>> {
        if limit == 0 || !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let mut rdr = csv::Reader::from_reader(file);

        let mut window: VecDeque<Observation> = VecDeque::with_capacity(limit.min(65_536));
        let mut unreadable = 0usize;

        for result in rdr.deserialize::<Observation>() {
            match result {
                Ok(observation) => {
                    if window.len() == limit {
                        window.pop_front();
                    }
                    window.push_back(observation);
                }
                Err(e) => {
                    unreadable += 1;
                    debug!(error = %e, "Skipping unreadable stored row");
                }
            }
        }

        if unreadable > 0 {
            warn!(unreadable, "Skipped stored rows that could not be read");
        }

        Ok(window.into_iter().rev().collect())
    }
}
