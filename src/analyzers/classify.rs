//! Delay classification over reconstructed dwell intervals.

use serde::Serialize;

use crate::analyzers::dwell::DwellInterval;
use crate::analyzers::utility::{mean, quantile_sorted, sorted};

/// Dwell, in minutes, at or above which the fixed policy flags a delay.
pub const FIXED_DELAY_MINUTES: f64 = 3.0;

/// Multiplier applied to the interquartile range above Q3.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// How delays are told apart from normal stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMode {
    /// Flag dwell above `Q3 + 1.5 * IQR` of the current window.
    Outlier,
    /// Flag dwell of at least 3 minutes seen more than once.
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q3: f64,
}

impl Quartiles {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    pub fn outlier_threshold(&self) -> f64 {
        self.q3 + IQR_MULTIPLIER * self.iqr()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub mode: ClassificationMode,
    pub total_intervals: usize,
    pub mean_dwell_minutes: f64,
    /// Minutes; exceeded (outlier) or reached (fixed) by flagged intervals.
    pub threshold_used: f64,
    pub flagged_count: usize,
    /// Only computed in outlier mode.
    pub quartiles: Option<Quartiles>,
}

/// Classifier output for a non-empty set of intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayAnalysis {
    /// Every interval that was classified.
    pub intervals: Vec<DwellInterval>,
    /// Delayed intervals, longest dwell first.
    pub flagged: Vec<DwellInterval>,
    pub summary: AnalysisSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Nothing to classify.
    InsufficientData,
    Classified(DelayAnalysis),
}

/// Linear-interpolation Q1/Q3 of the given dwell minutes, `None` when empty.
pub fn quartiles(minutes: &[f64]) -> Option<Quartiles> {
    let sorted = sorted(minutes);
    Some(Quartiles {
        q1: quantile_sorted(&sorted, 0.25)?,
        q3: quantile_sorted(&sorted, 0.75)?,
    })
}

/// Flags delayed intervals under `mode`.
///
/// Empty input yields [`Classification::InsufficientData`] before any
/// statistics are computed. Flagged intervals keep their input order among
/// equal dwell times.
pub fn classify(intervals: Vec<DwellInterval>, mode: ClassificationMode) -> Classification {
    if intervals.is_empty() {
        return Classification::InsufficientData;
    }

    let minutes: Vec<f64> = intervals.iter().map(DwellInterval::dwell_minutes).collect();

    let (threshold_used, quartiles) = match mode {
        ClassificationMode::Outlier => {
            let Some(q) = quartiles(&minutes) else {
                return Classification::InsufficientData;
            };
            (q.outlier_threshold(), Some(q))
        }
        ClassificationMode::Fixed => (FIXED_DELAY_MINUTES, None),
    };

    let is_delay = |i: &DwellInterval| match mode {
        ClassificationMode::Outlier => i.dwell_minutes() > threshold_used,
        ClassificationMode::Fixed => i.dwell_minutes() >= threshold_used && i.sample_count > 1,
    };

    let mut flagged: Vec<DwellInterval> = intervals.iter().filter(|&i| is_delay(i)).cloned().collect();
    flagged.sort_by(|a, b| b.dwell_minutes().total_cmp(&a.dwell_minutes()));

    let summary = AnalysisSummary {
        mode,
        total_intervals: intervals.len(),
        mean_dwell_minutes: mean(&minutes),
        threshold_used,
        flagged_count: flagged.len(),
        quartiles,
    };

    Classification::Classified(DelayAnalysis {
        intervals,
        flagged,
        summary,
    })
}
