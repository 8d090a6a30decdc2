use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::market::twelvedata::errors::TwelveDataError;
use crate::market::types::Candle;

/// Successful `/time_series` body. Only `values[].close` is consumed.
#[derive(Debug, Deserialize)]
pub struct TimeSeriesEnvelope {
    pub values: Vec<ValueRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ValueRecord {
    pub close: RawPrice,
}

/// Prices arrive as strings; numbers are tolerated.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Text(String),
    Number(serde_json::Number),
}

impl RawPrice {
    pub fn to_decimal(&self) -> Option<Decimal> {
        let raw = match self {
            RawPrice::Text(s) => s.trim().to_string(),
            RawPrice::Number(n) => n.to_string(),
        };
        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .ok()
    }
}

/// Error body, e.g. `{"code":401,"message":"...","status":"error"}`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

/// Decodes a `/time_series` body into candles, newest first as on the wire.
pub fn parse_time_series(body: &[u8]) -> Result<Vec<Candle>, TwelveDataError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| TwelveDataError::InvalidResponse(format!("body is not json: {e}")))?;

    if value.get("status").and_then(|s| s.as_str()) == Some("error") {
        let err: ErrorBody = serde_json::from_value(value)
            .map_err(|e| TwelveDataError::InvalidResponse(format!("malformed error body: {e}")))?;
        return Err(TwelveDataError::Api {
            code: err.code,
            message: err.message,
        });
    }

    let envelope: TimeSeriesEnvelope = serde_json::from_value(value)
        .map_err(|e| TwelveDataError::InvalidResponse(e.to_string()))?;

    envelope
        .values
        .iter()
        .enumerate()
        .map(|(i, record)| {
            record.close.to_decimal().map(Candle::new).ok_or_else(|| {
                TwelveDataError::InvalidResponse(format!(
                    "values[{i}].close is not a decimal: {:?}",
                    record.close
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_string_and_numeric_closes_in_wire_order() {
        let body = br#"{
            "meta": {"symbol": "BTC/USD", "interval": "15min"},
            "values": [
                {"datetime": "2024-05-01 10:15:00", "open": "1", "close": "100.5"},
                {"datetime": "2024-05-01 10:00:00", "open": "1", "close": 100.2}
            ],
            "status": "ok"
        }"#;

        let candles = parse_time_series(body).unwrap();
        assert_eq!(candles, vec![Candle::new(dec!(100.5)), Candle::new(dec!(100.2))]);
    }

    #[test]
    fn missing_values_is_schema_error() {
        let err = parse_time_series(br#"{"meta": {}, "status": "ok"}"#).unwrap_err();
        assert!(matches!(err, TwelveDataError::InvalidResponse(_)));
    }

    #[test]
    fn missing_close_is_schema_error() {
        let body = br#"{"values": [{"datetime": "2024-05-01 10:15:00", "open": "1"}]}"#;
        let err = parse_time_series(body).unwrap_err();
        assert!(matches!(err, TwelveDataError::InvalidResponse(_)));
    }

    #[test]
    fn unparsable_close_is_schema_error() {
        let body = br#"{"values": [{"close": "n/a"}]}"#;
        let err = parse_time_series(body).unwrap_err();
        assert!(err.to_string().contains("values[0].close"));
    }

    #[test]
    fn error_body_surfaces_api_code() {
        let body = br#"{"code": 401, "message": "apikey is invalid", "status": "error"}"#;
        match parse_time_series(body).unwrap_err() {
            TwelveDataError::Api { code, message } => {
                assert_eq!(code, 401);
                assert_eq!(message, "apikey is invalid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_schema_error() {
        let err = parse_time_series(b"<html>gateway timeout</html>").unwrap_err();
        assert!(matches!(err, TwelveDataError::InvalidResponse(_)));
    }
}
