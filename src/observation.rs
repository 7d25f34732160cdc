//! Canonical train-observation schema shared by the store and the analysis.

use chrono::{DateTime, NaiveDateTime, ParseResult, Utc};
use serde::{Deserialize, Serialize};

/// Layout of the feed's `recptnDt` receipt time.
pub const OBSERVED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One sighting of a train at a station.
///
/// Feed values are carried verbatim; `direction` and `status` keep the raw
/// codes (`0` up / `1` down, `0` entering, `1` arrived, `2` departed, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// When the collector stored this row.
    pub collected_at: DateTime<Utc>,
    pub line_id: String,
    pub line_name: Option<String>,
    pub station_id: Option<String>,
    pub station_name: Option<String>,
    /// Unique only within one service day.
    pub train_number: String,
    pub last_received_date: Option<String>,
    /// Feed-reported receipt time, unparsed.
    pub observed_at: Option<String>,
    pub direction: Option<String>,
    pub destination_station_id: Option<String>,
    pub destination_station_name: Option<String>,
    pub status: Option<String>,
    pub is_express: Option<String>,
    pub is_last_train: bool,
}

impl Observation {
    /// Parses `observed_at` with [`OBSERVED_AT_FORMAT`].
    ///
    /// Returns `None` when the field is absent or does not parse.
    pub fn observed_time(&self) -> Option<NaiveDateTime> {
        self.observed_at
            .as_deref()
            .and_then(|raw| parse_observed_at(raw).ok())
    }
}

pub fn parse_observed_at(raw: &str) -> ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), OBSERVED_AT_FORMAT)
}
