pub mod bitfinex;
pub mod bitstamp;
pub mod http;

use async_trait::async_trait;
use thiserror::Error;
use crate::price_infra::{PriceSourceConfig, ResponseShape, SourceQuote};

/// Why a single upstream fetch produced no price. Always returned as a value;
/// one source failing must never abort the fetch against the other.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    #[error("upstream response malformed: {0}")]
    Malformed(String),
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[async_trait]
pub trait PriceConnector: Send + Sync {
    async fn fetch(&self, source: &PriceSourceConfig) -> FetchResult<SourceQuote>;
}

/// Extracts the latest close price from a response body of the given shape.
pub fn parse_close(shape: ResponseShape, body: &str) -> FetchResult<f64> {
    let raw = match shape {
        ResponseShape::Bitstamp => bitstamp::parse_close(body)?,
        ResponseShape::Bitfinex => bitfinex::parse_close(body)?,
    };
    checked_price(raw)
}

fn checked_price(price: f64) -> FetchResult<f64> {
    if !price.is_finite() {
        return Err(FetchError::Malformed(format!("non-finite price {}", price)));
    }
    if price < 0.0 {
        return Err(FetchError::Malformed(format!("negative price {}", price)));
    }
    Ok(price)
}
