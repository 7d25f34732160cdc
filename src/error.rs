//! Typed errors raised by configuration and record normalization.

use thiserror::Error;

/// Problems detected while building configuration, before any work starts.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingVar(&'static str),
    #[error("{name} has an invalid value: {value:?}")]
    InvalidVar { name: &'static str, value: String },
    #[error("noise threshold must be a non-negative number of seconds, got {0}")]
    InvalidNoiseThreshold(f64),
}

/// Why a single feed record could not become an observation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record is missing required field `{0}`")]
    MissingField(&'static str),
}
