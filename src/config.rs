//! Runtime configuration for the collector and the dwell analysis.
//!
//! Collector settings come from environment variables (a `.env` file is loaded
//! by the binary first). Analysis settings are validated at construction so a
//! bad threshold never reaches the pipeline.

use crate::analyzers::classify::ClassificationMode;
use crate::analyzers::dwell::NoiseFilter;
use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://swopenAPI.seoul.go.kr/api/subway";
pub const DEFAULT_STORE_PATH: &str = "data/observations.csv";
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Lines polled when `SUBWAY_TARGET_LINES` is not set.
pub const DEFAULT_TARGET_LINES: &[&str] = &[
    "1호선",
    "2호선",
    "3호선",
    "4호선",
    "5호선",
    "6호선",
    "7호선",
    "8호선",
    "9호선",
    "경의중앙선",
    "수인분당선",
    "신분당선",
    "공항철도",
    "경춘선",
];

/// Settings for the position collector.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub api_key: String,
    pub base_url: String,
    pub store_path: String,
    pub target_lines: Vec<String>,
    /// Rows requested per line, the `0/{page_size}` window of the API.
    pub page_size: u32,
}

impl MonitorConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("SEOUL_API_KEY").ok_or(ConfigError::MissingVar("SEOUL_API_KEY"))?;

        let base_url = non_empty("SUBWAY_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let store_path =
            non_empty("SUBWAY_STORE_PATH").unwrap_or_else(|| DEFAULT_STORE_PATH.to_string());

        let target_lines = match non_empty("SUBWAY_TARGET_LINES") {
            Some(raw) => {
                let lines: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect();
                if lines.is_empty() {
                    return Err(ConfigError::InvalidVar {
                        name: "SUBWAY_TARGET_LINES",
                        value: raw,
                    });
                }
                lines
            }
            None => DEFAULT_TARGET_LINES.iter().map(|l| l.to_string()).collect(),
        };

        let page_size = match non_empty("SUBWAY_PAGE_SIZE") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        name: "SUBWAY_PAGE_SIZE",
                        value: raw,
                    });
                }
            },
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            api_key,
            base_url,
            store_path,
            target_lines,
            page_size,
        })
    }
}

/// Noise filter and classification policy for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    noise_filter: NoiseFilter,
    mode: ClassificationMode,
}

impl AnalysisConfig {
    pub fn new(noise_threshold_seconds: f64, mode: ClassificationMode) -> Result<Self, ConfigError> {
        Ok(Self {
            noise_filter: NoiseFilter::new(noise_threshold_seconds)?,
            mode,
        })
    }

    /// Exploratory report: drop stays under 10 seconds, flag IQR outliers.
    pub fn report() -> Self {
        Self {
            noise_filter: NoiseFilter::TEN_SECONDS,
            mode: ClassificationMode::Outlier,
        }
    }

    /// Operational check: keep every interval, flag stays of 3+ minutes.
    pub fn operational() -> Self {
        Self {
            noise_filter: NoiseFilter::OFF,
            mode: ClassificationMode::Fixed,
        }
    }

    /// Preset matching the given mode.
    pub fn for_mode(mode: ClassificationMode) -> Self {
        match mode {
            ClassificationMode::Outlier => Self::report(),
            ClassificationMode::Fixed => Self::operational(),
        }
    }

    pub fn noise_threshold_seconds(&self) -> f64 {
        self.noise_filter.min_dwell_seconds()
    }

    pub fn noise_filter(&self) -> NoiseFilter {
        self.noise_filter
    }

    pub fn mode(&self) -> ClassificationMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let err = MonitorConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("SEOUL_API_KEY"));

        let err = MonitorConfig::from_lookup(lookup(&[("SEOUL_API_KEY", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("SEOUL_API_KEY"));
    }

    #[test]
    fn test_defaults_applied() {
        let config = MonitorConfig::from_lookup(lookup(&[("SEOUL_API_KEY", "abc")])).unwrap();

        assert_eq!(config.api_key, "abc");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.store_path, DEFAULT_STORE_PATH);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.target_lines.len(), 14);
        assert_eq!(config.target_lines[0], "1호선");
    }

    #[test]
    fn test_overrides() {
        let config = MonitorConfig::from_lookup(lookup(&[
            ("SEOUL_API_KEY", "abc"),
            ("SUBWAY_API_BASE_URL", "http://localhost:8080/api/"),
            ("SUBWAY_TARGET_LINES", " 2호선, ,신분당선 "),
            ("SUBWAY_PAGE_SIZE", "50"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.target_lines, vec!["2호선", "신분당선"]);
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn test_invalid_page_size() {
        let err = MonitorConfig::from_lookup(lookup(&[
            ("SEOUL_API_KEY", "abc"),
            ("SUBWAY_PAGE_SIZE", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidVar {
                name: "SUBWAY_PAGE_SIZE",
                ..
            }
        ));
    }

    #[test]
    fn test_target_lines_only_separators() {
        let err = MonitorConfig::from_lookup(lookup(&[
            ("SEOUL_API_KEY", "abc"),
            ("SUBWAY_TARGET_LINES", ", ,"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { .. }));
    }

    #[test]
    fn test_analysis_config_rejects_bad_thresholds() {
        assert_eq!(
            AnalysisConfig::new(-1.0, ClassificationMode::Outlier),
            Err(ConfigError::InvalidNoiseThreshold(-1.0))
        );
        assert!(AnalysisConfig::new(f64::NAN, ClassificationMode::Fixed).is_err());
        assert!(AnalysisConfig::new(f64::INFINITY, ClassificationMode::Fixed).is_err());
    }

    #[test]
    fn test_analysis_presets() {
        let report = AnalysisConfig::report();
        assert_eq!(report.noise_threshold_seconds(), 10.0);
        assert_eq!(report.mode(), ClassificationMode::Outlier);

        let operational = AnalysisConfig::operational();
        assert_eq!(operational.noise_threshold_seconds(), 0.0);
        assert_eq!(operational.mode(), ClassificationMode::Fixed);

        assert_eq!(AnalysisConfig::for_mode(ClassificationMode::Fixed), operational);
        assert_eq!(
            AnalysisConfig::new(0.0, ClassificationMode::Outlier)
                .unwrap()
                .noise_threshold_seconds(),
            0.0
        );
    }
}
