//! Maps raw feed records onto [`Observation`].

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::error::RecordError;
use crate::feed::RawPosition;
use crate::observation::Observation;

/// Result of normalizing one batch of feed records.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub observations: Vec<Observation>,
    /// Records that could not become an observation.
    pub dropped: usize,
}

/// Reads a field as text. Numbers are kept as their decimal text; `null`,
/// empty strings and nested values count as missing.
fn text(record: &Value, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

/// Converts one feed record into an observation stamped with `collected_at`.
pub fn normalize(record: &RawPosition, collected_at: DateTime<Utc>) -> Result<Observation, RecordError> {
    if !record.is_object() {
        return Err(RecordError::NotAnObject);
    }

    let line_id = text(record, "subwayId").ok_or(RecordError::MissingField("subwayId"))?;
    let train_number = text(record, "trainNo").ok_or(RecordError::MissingField("trainNo"))?;

    Ok(Observation {
        collected_at,
        line_id,
        line_name: text(record, "subwayNm"),
        station_id: text(record, "statnId"),
        station_name: text(record, "statnNm"),
        train_number,
        last_received_date: text(record, "lastRecptnDt"),
        observed_at: text(record, "recptnDt"),
        direction: text(record, "updnLine"),
        destination_station_id: text(record, "statnTid"),
        destination_station_name: text(record, "statnTnm"),
        status: text(record, "trainSttus"),
        is_express: text(record, "directAt"),
        is_last_train: text(record, "lstcarAt").as_deref() == Some("1"),
    })
}

/// Normalizes every record, dropping (and counting) the unusable ones.
pub fn normalize_batch(records: &[RawPosition], collected_at: DateTime<Utc>) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for record in records {
        match normalize(record, collected_at) {
            Ok(observation) => batch.observations.push(observation),
            Err(e) => {
                warn!(error = %e, "Dropping feed record");
                batch.dropped += 1;
            }
        }
    }

    batch
}
