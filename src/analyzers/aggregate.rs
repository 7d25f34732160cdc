//! Per-line dwell statistics and the dwell histogram used by the report.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyzers::dwell::DwellInterval;
use crate::analyzers::utility::{mean, quantile_sorted, sorted};

/// Label used for intervals whose line name was missing in the feed.
pub const UNKNOWN_LINE: &str = "(unknown)";

/// Dwell statistics for one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineBreakdown {
    pub line_name: String,
    pub intervals: usize,
    pub mean_minutes: f64,
    pub median_minutes: f64,
    pub max_minutes: f64,
}

/// Groups intervals by line name and summarizes each line, ordered by name.
pub fn line_breakdown(intervals: &[DwellInterval]) -> Vec<LineBreakdown> {
    let mut per_line: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

    for interval in intervals {
        per_line
            .entry(interval.line_name.as_deref().unwrap_or(UNKNOWN_LINE))
            .or_default()
            .push(interval.dwell_minutes());
    }

    per_line
        .into_iter()
        .map(|(line_name, minutes)| {
            let sorted = sorted(&minutes);
            LineBreakdown {
                line_name: line_name.to_string(),
                intervals: minutes.len(),
                mean_minutes: mean(&minutes),
                median_minutes: quantile_sorted(&sorted, 0.5).unwrap_or(0.0),
                max_minutes: sorted.last().copied().unwrap_or(0.0),
            }
        })
        .collect()
}

/// Buckets dwell minutes into `bucket_minutes`-wide bins starting at zero.
///
/// Returns `(lower_bound, count)` pairs for every bin up to the largest
/// value, including empty bins in between.
pub fn histogram(intervals: &[DwellInterval], bucket_minutes: f64) -> Vec<(f64, usize)> {
    if intervals.is_empty() || bucket_minutes <= 0.0 {
        return Vec::new();
    }

    let bin = |m: f64| (m / bucket_minutes).floor() as usize;
    let max_bin = intervals
        .iter()
        .map(|i| bin(i.dwell_minutes()))
        .max()
        .unwrap_or(0);

    let mut counts = vec![0usize; max_bin + 1];
    for interval in intervals {
        counts[bin(interval.dwell_minutes())] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| (i as f64 * bucket_minutes, count))
        .collect()
}
