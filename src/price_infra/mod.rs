pub mod connectors;
pub mod aggregator;
pub mod cache;
pub mod resolver;
pub mod sweeper;

use serde::{Deserialize, Serialize};

pub const BITSTAMP_HOURLY_URL: &str = "https://www.bitstamp.net/api/v2/ohlc/btcusd/?step=3600&limit=1";
pub const BITFINEX_HOURLY_URL: &str = "https://api.bitfinex.com/v2/candles/trade:1h:tBTCUSD/hist?limit=1";

/// One upstream feed: where to fetch and how to read the close price out of the body.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PriceSourceConfig {
    pub source_id: String,
    pub url: String,
    pub shape: ResponseShape,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// `{"data": {"ohlc": [{"close": "45000.0", ...}]}}`
    Bitstamp,
    /// `[[mts, open, close, high, low, volume], ...]`
    Bitfinex,
}

impl PriceSourceConfig {
    pub fn new(source_id: &str, url: &str, shape: ResponseShape) -> Self {
        PriceSourceConfig {
            source_id: source_id.to_string(),
            url: url.to_string(),
            shape,
            enabled: true,
        }
    }

    pub fn bitstamp() -> Self {
        Self::new("bitstamp", BITSTAMP_HOURLY_URL, ResponseShape::Bitstamp)
    }

    pub fn bitfinex() -> Self {
        Self::new("bitfinex", BITFINEX_HOURLY_URL, ResponseShape::Bitfinex)
    }

    pub fn defaults() -> Vec<Self> {
        vec![Self::bitstamp(), Self::bitfinex()]
    }
}

/// Latest close price reported by a single source during one resolution attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceQuote {
    pub source_id: String,
    pub price: f64,
}
