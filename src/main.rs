//! CLI entry point for the subway monitor.
//!
//! Provides subcommands for polling realtime train positions into the
//! observation store, importing saved API responses, and running the dwell
//! time / delay analysis over the most recent observations.

use anyhow::Result;
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use subway_monitor::analyzers::classify::{Classification, ClassificationMode};
use subway_monitor::analyzers::pipeline::{AnalysisRun, run_analysis};
use subway_monitor::analyzers::report::{export_intervals, log_delays, render_markdown, write_report};
use subway_monitor::{
    collector::collect_once,
    config::{AnalysisConfig, DEFAULT_STORE_PATH, MonitorConfig},
    feed::SeoulOpenApi,
    fetch::BasicClient,
    normalize::normalize_batch,
    output::{append_records, print_json},
    parser::parse_position_response,
    stats::CycleSummary,
    store::{CsvObservationStore, ObservationStore},
};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "subway_monitor")]
#[command(about = "Collects realtime subway positions and detects long station dwells", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll realtime positions for every configured line into the store
    Collect {
        /// Seconds between collection cycles
        #[arg(short = 'i', long, default_value_t = 60)]
        interval_secs: u64,

        /// Number of cycles to run (0 = until interrupted)
        #[arg(short = 'n', long, default_value_t = 0)]
        num_cycles: usize,

        /// Pause between line requests, in milliseconds
        #[arg(long, default_value_t = 500)]
        request_delay_ms: u64,

        /// Optional: CSV file to append per-line collection statistics to
        #[arg(long)]
        stats_log: Option<PathBuf>,
    },
    /// Store the records of a saved realtimePosition response body
    Ingest {
        /// Path to a JSON response saved from the API
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Observation store path (defaults to SUBWAY_STORE_PATH)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
    /// Reconstruct dwell times from recent observations and flag delays
    Analyze {
        /// Number of most recent observations to analyze
        #[arg(short, long, default_value_t = 10_000)]
        limit: usize,

        /// Delay classification policy
        #[arg(short, long, value_enum, default_value_t = ClassificationMode::Outlier)]
        mode: ClassificationMode,

        /// Minimum dwell in seconds; shorter intervals are noise
        /// (default: 10 for outlier mode, 0 for fixed mode)
        #[arg(long)]
        noise_threshold: Option<f64>,

        /// Markdown report destination
        #[arg(short, long, default_value = "docs/delay_analysis_report.md")]
        report: PathBuf,

        /// Number of delays listed (default: 10 for outlier mode, 20 for fixed mode)
        #[arg(short, long)]
        top: Option<usize>,

        /// Optional: CSV file to export every reconstructed interval to
        #[arg(long)]
        export: Option<PathBuf>,

        /// Observation store path (defaults to SUBWAY_STORE_PATH)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/subway_monitor.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("subway_monitor.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            interval_secs,
            num_cycles,
            request_delay_ms,
            stats_log,
        } => {
            let config = MonitorConfig::from_env()?;
            collect(
                &config,
                interval_secs,
                num_cycles,
                Duration::from_millis(request_delay_ms),
                stats_log.as_deref(),
            )
            .await?;
        }
        Commands::Ingest { source, store } => {
            let store = CsvObservationStore::new(store.unwrap_or_else(store_path_from_env));
            ingest(&source, &store)?;
        }
        Commands::Analyze {
            limit,
            mode,
            noise_threshold,
            report,
            top,
            export,
            store,
        } => {
            let config = match noise_threshold {
                Some(seconds) => AnalysisConfig::new(seconds, mode)?,
                None => AnalysisConfig::for_mode(mode),
            };
            let top = top.unwrap_or(match mode {
                ClassificationMode::Outlier => 10,
                ClassificationMode::Fixed => 20,
            });
            let store = CsvObservationStore::new(store.unwrap_or_else(store_path_from_env));
            analyze(&store, limit, &config, &report, top, export.as_deref())?;
        }
    }

    Ok(())
}

fn store_path_from_env() -> PathBuf {
    std::env::var("SUBWAY_STORE_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string())
        .into()
}

/// Runs collection cycles at a fixed interval until `num_cycles` is reached
/// (or forever when it is zero), stopping early on Ctrl+C.
#[tracing::instrument(skip(config, stats_log), fields(lines = config.target_lines.len()))]
async fn collect(
    config: &MonitorConfig,
    interval_secs: u64,
    num_cycles: usize,
    request_delay: Duration,
    stats_log: Option<&Path>,
) -> Result<()> {
    let feed = SeoulOpenApi::from_config(BasicClient::new()?, config);
    let store = CsvObservationStore::new(&config.store_path);

    info!(store = %config.store_path, lines = ?config.target_lines, "Collector starting");
    if num_cycles == 0 {
        info!(interval_secs, "Collecting until interrupted. Press Ctrl+C to stop.");
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut cycle = 0usize;

    loop {
        if num_cycles > 0 && cycle >= num_cycles {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Collector stopped by user");
                break;
            }
        }
        cycle += 1;

        let samples = collect_once(&feed, &store, &config.target_lines, Utc::now(), request_delay).await;
        let summary = CycleSummary::from_samples(&samples);
        info!(
            cycle,
            received = summary.received,
            stored = summary.stored,
            dropped = summary.dropped,
            failed_lines = summary.failed_lines,
            "Collection cycle complete"
        );

        if let Some(path) = stats_log {
            if let Err(e) = append_records(path, &samples) {
                error!(error = %e, "Failed to write collection statistics");
            }
        }
    }

    info!(cycles = cycle, "Collector finished");
    Ok(())
}

/// Normalizes a saved API response and appends it to the store.
#[tracing::instrument(skip(source, store), fields(source = %source.display()))]
fn ingest(source: &Path, store: &CsvObservationStore) -> Result<()> {
    let bytes = std::fs::read(source)?;
    let records = parse_position_response(&bytes)?;
    let batch = normalize_batch(&records, Utc::now());
    let stored = store.append(&batch.observations)?;

    info!(
        received = records.len(),
        stored,
        dropped = batch.dropped,
        store = %store.path().display(),
        "Response ingested"
    );
    Ok(())
}

/// Reads the newest `limit` observations, classifies delays and writes the
/// report. A failed read is reported as insufficient data.
#[tracing::instrument(skip(store, config, export), fields(mode = ?config.mode()))]
fn analyze(
    store: &CsvObservationStore,
    limit: usize,
    config: &AnalysisConfig,
    report: &Path,
    top: usize,
    export: Option<&Path>,
) -> Result<()> {
    let run = match store.fetch_recent(limit) {
        Ok(observations) => {
            info!(rows = observations.len(), "Observations loaded");
            run_analysis(&observations, config)
        }
        Err(e) => {
            warn!(error = %e, "Could not read observations");
            AnalysisRun::insufficient(*config)
        }
    };

    log_delays(&run, top);

    let markdown = render_markdown(&run, &Local::now(), top)?;
    write_report(report, &markdown)?;

    if let Classification::Classified(analysis) = &run.classification {
        print_json(&analysis.summary)?;
    }

    if let Some(path) = export {
        if run.reconstructed.is_empty() {
            warn!(path = %path.display(), "No reconstructed intervals to export");
        } else {
            export_intervals(path, &run.reconstructed)?;
        }
    }

    Ok(())
}
