//! Parser for the realtime-position JSON envelope.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::warn;

use crate::feed::RawPosition;

/// Extracts the `realtimePositionList` records from an API response body.
///
/// The API signals "no trains" or quota problems with a `RESULT` (or
/// `errorMessage`) object instead of the list; that case is logged and yields
/// an empty list.
///
/// # Errors
///
/// Returns an error if the body is not valid JSON, or if the position list is
/// present but is not an array.
pub fn parse_position_response(bytes: &[u8]) -> Result<Vec<RawPosition>> {
    let body: Value = serde_json::from_slice(bytes).context("response is not valid JSON")?;

    match body.get("realtimePositionList") {
        Some(Value::Array(records)) => Ok(records.clone()),
        Some(other) => Err(anyhow::anyhow!(
            "realtimePositionList is not an array: {other}"
        )),
        None => {
            let message = body["RESULT"]["MESSAGE"]
                .as_str()
                .or_else(|| body["errorMessage"]["message"].as_str())
                .unwrap_or("no realtimePositionList in response");
            warn!(message, "Position feed returned no records");
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position_list() {
        let body = br#"{
            "errorMessage": {"status": 200, "code": "INFO-000", "message": "ok"},
            "realtimePositionList": [
                {"subwayId": "1002", "trainNo": "2241"},
                {"subwayId": "1002", "trainNo": "2243"}
            ]
        }"#;

        let records = parse_position_response(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["trainNo"], "2243");
    }

    #[test]
    fn test_parse_result_message_returns_empty() {
        let body = r#"{"RESULT": {"CODE": "INFO-200", "MESSAGE": "해당하는 데이터가 없습니다."}}"#;
        let records = parse_position_response(body.as_bytes()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_position_response(b"<html>quota exceeded</html>");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_list_of_wrong_type() {
        let result = parse_position_response(br#"{"realtimePositionList": "nope"}"#);
        assert!(result.is_err());
    }
}
