//! Dwell-time reconstruction and delay detection.
//!
//! Observations are folded into per-(line, station, train, direction) dwell
//! intervals, filtered for noise, classified as delayed or normal, and
//! rendered into a report.

pub mod aggregate;
pub mod classify;
pub mod dwell;
pub mod pipeline;
pub mod report;
pub mod utility;
