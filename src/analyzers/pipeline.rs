//! Read-path orchestration: observations → intervals → noise filter → classes.

use tracing::info;

use crate::analyzers::classify::{Classification, classify};
use crate::analyzers::dwell::{DwellInterval, reconstruct};
use crate::config::AnalysisConfig;
use crate::observation::Observation;

/// Everything one analysis invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRun {
    pub config: AnalysisConfig,
    pub observations_read: usize,
    /// Observations excluded because their receipt time did not parse.
    pub unparseable: usize,
    /// Every interval rebuilt from the window, before noise filtering.
    pub reconstructed: Vec<DwellInterval>,
    /// Intervals dropped by the noise filter.
    pub discarded_as_noise: usize,
    pub classification: Classification,
}

impl AnalysisRun {
    /// Result for a run that had nothing to work with (empty or failed fetch).
    pub fn insufficient(config: AnalysisConfig) -> Self {
        Self {
            config,
            observations_read: 0,
            unparseable: 0,
            reconstructed: Vec::new(),
            discarded_as_noise: 0,
            classification: Classification::InsufficientData,
        }
    }
}

/// Runs reconstruction, noise filtering and classification over one window
/// of observations.
pub fn run_analysis(observations: &[Observation], config: &AnalysisConfig) -> AnalysisRun {
    if observations.is_empty() {
        info!("No observations to analyze");
        return AnalysisRun::insufficient(*config);
    }

    let reconstruction = reconstruct(observations);
    let reconstructed = reconstruction.intervals;

    let valid = config.noise_filter().apply(reconstructed.clone());
    let discarded_as_noise = reconstructed.len() - valid.len();

    info!(
        observations = observations.len(),
        unparseable = reconstruction.unparseable,
        reconstructed = reconstructed.len(),
        valid = valid.len(),
        noise_threshold_seconds = config.noise_threshold_seconds(),
        "Dwell intervals reconstructed"
    );

    AnalysisRun {
        config: *config,
        observations_read: observations.len(),
        unparseable: reconstruction.unparseable,
        reconstructed,
        discarded_as_noise,
        classification: classify(valid, config.mode()),
    }
}
