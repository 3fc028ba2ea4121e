use serde::Deserialize;
use crate::price_infra::connectors::{FetchError, FetchResult};

#[derive(Deserialize)]
struct BitstampOhlcResponse {
    data: BitstampOhlcData,
}

#[derive(Deserialize)]
struct BitstampOhlcData {
    ohlc: Vec<BitstampCandle>,
}

#[derive(Deserialize)]
struct BitstampCandle {
    close: String,  // Close price, string-encoded
}

pub fn parse_close(body: &str) -> FetchResult<f64> {
    let response: BitstampOhlcResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Malformed(format!("bitstamp ohlc: {}", e)))?;

    let candle = response.data.ohlc.first()
        .ok_or_else(|| FetchError::Malformed("bitstamp ohlc: no candles".to_string()))?;

    candle.close.trim().parse::<f64>()
        .map_err(|_| FetchError::Malformed(format!("bitstamp ohlc: unparsable close {:?}", candle.close)))
}
