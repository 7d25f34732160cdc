//! Human-readable rendering of an analysis run.
//!
//! The Markdown report keeps the "insufficient data" and "no delays" states
//! visibly distinct; both are normal outcomes, not failures.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt::{Display, Write as _};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::analyzers::aggregate::{UNKNOWN_LINE, histogram, line_breakdown};
use crate::analyzers::classify::{Classification, ClassificationMode, DelayAnalysis};
use crate::analyzers::dwell::DwellInterval;
use crate::analyzers::pipeline::AnalysisRun;
use crate::output::{ensure_parent_dir, write_records};

const HISTOGRAM_MAX_BINS: f64 = 30.0;
const HISTOGRAM_BAR_WIDTH: usize = 40;

/// Display text for a raw feed status code.
pub fn status_label(raw: Option<&str>) -> String {
    match raw {
        Some("0") => "entering".into(),
        Some("1") => "arrived".into(),
        Some("2") => "departed".into(),
        Some("3") => "departed previous station".into(),
        Some("99") => "in service".into(),
        Some(other) => other.into(),
        None => "-".into(),
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn mode_description(run: &AnalysisRun) -> String {
    let mode = match run.config.mode() {
        ClassificationMode::Outlier => "statistical outlier (Q3 + 1.5 × IQR)",
        ClassificationMode::Fixed => "fixed threshold (≥ 3 min, seen more than once)",
    };
    format!(
        "{mode}, noise filter ≥ {} s",
        run.config.noise_threshold_seconds()
    )
}

/// Renders the Markdown report for one run, listing at most `top_k` delays.
pub fn render_markdown<Tz>(run: &AnalysisRun, generated_at: &DateTime<Tz>, top_k: usize) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();

    writeln!(out, "# Subway Delay Analysis Report\n")?;
    writeln!(out, "**Generated**: {}\n", generated_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "**Method**: {}\n", mode_description(run))?;
    writeln!(
        out,
        "**Window**: {} observations read, {} without a usable receipt time, {} intervals discarded as noise\n",
        run.observations_read, run.unparseable, run.discarded_as_noise
    )?;

    let analysis = match &run.classification {
        Classification::InsufficientData => {
            writeln!(out, "## Analysis unavailable\n")?;
            writeln!(
                out,
                "Not enough data to analyze: no dwell intervals remained after filtering."
            )?;
            return Ok(out);
        }
        Classification::Classified(analysis) => analysis,
    };

    write_summary(&mut out, analysis)?;
    write_distribution(&mut out, &analysis.intervals, analysis.summary.threshold_used)?;
    write_line_table(&mut out, &analysis.intervals)?;
    write_hotspots(&mut out, &analysis.flagged, top_k)?;

    Ok(out)
}

fn write_summary(out: &mut String, analysis: &DelayAnalysis) -> std::fmt::Result {
    let s = &analysis.summary;
    writeln!(out, "## 1. Summary Statistics\n")?;
    writeln!(out, "- **Dwell intervals analyzed**: {}", s.total_intervals)?;
    writeln!(out, "- **Mean dwell time**: {:.2} min", s.mean_dwell_minutes)?;
    if let Some(q) = &s.quartiles {
        writeln!(
            out,
            "- **Quartiles**: Q1 = {:.2} min, Q3 = {:.2} min, IQR = {:.2} min",
            q.q1,
            q.q3,
            q.iqr()
        )?;
    }
    let rule = match s.mode {
        ClassificationMode::Outlier => "longer than this is a delay",
        ClassificationMode::Fixed => "at least this long is a delay",
    };
    writeln!(
        out,
        "- **Delay threshold**: {:.2} min ({rule})",
        s.threshold_used
    )?;
    writeln!(out, "- **Delays detected**: {}\n", s.flagged_count)
}

fn write_distribution(out: &mut String, intervals: &[DwellInterval], threshold: f64) -> std::fmt::Result {
    let max_minutes = intervals
        .iter()
        .map(DwellInterval::dwell_minutes)
        .fold(0.0_f64, f64::max);
    let bucket = (max_minutes / HISTOGRAM_MAX_BINS).ceil().max(1.0);
    let bins = histogram(intervals, bucket);
    let tallest = bins.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);

    writeln!(out, "## 2. Dwell Time Distribution\n")?;
    writeln!(out, "```text")?;
    for (lower, count) in bins {
        let bar = "#".repeat((count * HISTOGRAM_BAR_WIDTH).div_ceil(tallest));
        let marker = if threshold >= lower && threshold < lower + bucket {
            " <- threshold"
        } else {
            ""
        };
        writeln!(
            out,
            "{:>5.0}-{:<5.0} min | {bar} {count}{marker}",
            lower,
            lower + bucket
        )?;
    }
    writeln!(out, "```\n")
}

fn write_line_table(out: &mut String, intervals: &[DwellInterval]) -> std::fmt::Result {
    writeln!(out, "## 3. Dwell Time by Line\n")?;
    writeln!(out, "| Line | Intervals | Mean (min) | Median (min) | Max (min) |")?;
    writeln!(out, "|:---|---:|---:|---:|---:|")?;
    for row in line_breakdown(intervals) {
        writeln!(
            out,
            "| {} | {} | {:.2} | {:.2} | {:.2} |",
            row.line_name, row.intervals, row.mean_minutes, row.median_minutes, row.max_minutes
        )?;
    }
    writeln!(out)
}

fn write_hotspots(out: &mut String, flagged: &[DwellInterval], top_k: usize) -> std::fmt::Result {
    writeln!(out, "## 4. Top {top_k} Delay Hotspots\n")?;
    if flagged.is_empty() {
        return writeln!(
            out,
            "No notable delays: no dwell interval exceeded the delay threshold."
        );
    }

    writeln!(
        out,
        "| Rank | Line | Station | Train | Direction | Dwell (min) | Status | First seen |"
    )?;
    writeln!(out, "|:---:|:---|:---|:---:|:---:|---:|:---|:---:|")?;
    for (rank, interval) in flagged.iter().take(top_k).enumerate() {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | **{:.2}** | {} | {} |",
            rank + 1,
            interval.line_name.as_deref().unwrap_or(UNKNOWN_LINE),
            or_dash(interval.station_name.as_deref()),
            interval.train_number,
            or_dash(interval.direction.as_deref()),
            interval.dwell_minutes(),
            status_label(interval.status.as_deref()),
            interval.arrival_time.format("%H:%M"),
        )?;
    }
    if flagged.len() > top_k {
        writeln!(out, "\n_{} more delays not shown._", flagged.len() - top_k)?;
    }
    Ok(())
}

/// Writes a rendered report, creating parent directories as needed.
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, content).with_context(|| format!("failed to write report {}", path.display()))?;
    info!(path = %path.display(), "Report written");
    Ok(())
}

/// Logs the outcome of a run, listing at most `top_k` delays.
pub fn log_delays(run: &AnalysisRun, top_k: usize) {
    let analysis = match &run.classification {
        Classification::InsufficientData => {
            warn!(
                observations = run.observations_read,
                "Not enough data to analyze"
            );
            return;
        }
        Classification::Classified(analysis) => analysis,
    };

    let s = &analysis.summary;
    info!(
        intervals = s.total_intervals,
        flagged = s.flagged_count,
        mean_dwell_minutes = s.mean_dwell_minutes,
        threshold_minutes = s.threshold_used,
        "Delay analysis complete"
    );

    if analysis.flagged.is_empty() {
        info!("No delayed or long-dwelling trains detected");
        return;
    }

    for interval in analysis.flagged.iter().take(top_k) {
        warn!(
            line = or_dash(interval.line_name.as_deref()),
            station = or_dash(interval.station_name.as_deref()),
            train = %interval.train_number,
            status = %status_label(interval.status.as_deref()),
            dwell_minutes = interval.dwell_minutes(),
            first_seen = %interval.arrival_time.format("%H:%M"),
            "Long dwell"
        );
    }
}

/// Flat CSV row for one interval.
#[derive(Debug, Serialize)]
struct IntervalRow<'a> {
    line_name: Option<&'a str>,
    station_name: Option<&'a str>,
    train_number: &'a str,
    direction: Option<&'a str>,
    arrival_time: String,
    last_seen_time: String,
    sample_count: usize,
    status: Option<&'a str>,
    dwell_seconds: i64,
    dwell_minutes: f64,
}

impl<'a> From<&'a DwellInterval> for IntervalRow<'a> {
    fn from(i: &'a DwellInterval) -> Self {
        Self {
            line_name: i.line_name.as_deref(),
            station_name: i.station_name.as_deref(),
            train_number: &i.train_number,
            direction: i.direction.as_deref(),
            arrival_time: i.arrival_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            last_seen_time: i.last_seen_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            sample_count: i.sample_count,
            status: i.status.as_deref(),
            dwell_seconds: i.dwell_seconds,
            dwell_minutes: i.dwell_minutes(),
        }
    }
}

/// Writes intervals to a CSV file, delayed or not. The binary passes
/// [`AnalysisRun::reconstructed`], so noise is exported too.
pub fn export_intervals(path: &Path, intervals: &[DwellInterval]) -> Result<()> {
    let rows: Vec<IntervalRow> = intervals.iter().map(IntervalRow::from).collect();
    write_records(path, &rows)?;
    info!(path = %path.display(), rows = rows.len(), "Intervals exported");
    Ok(())
}
