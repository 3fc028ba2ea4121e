use serde_json::Value;
use crate::price_infra::connectors::{FetchError, FetchResult};

// [MTS, OPEN, CLOSE, HIGH, LOW, VOLUME]
const CLOSE_INDEX: usize = 2;

pub fn parse_close(body: &str) -> FetchResult<f64> {
    let candles: Vec<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| FetchError::Malformed(format!("bitfinex candles: {}", e)))?;

    let candle = candles.first()
        .ok_or_else(|| FetchError::Malformed("bitfinex candles: no candles".to_string()))?;

    candle.get(CLOSE_INDEX)
        .and_then(Value::as_f64)
        .ok_or_else(|| FetchError::Malformed("bitfinex candles: close is missing or not a number".to_string()))
}
