use axum::{
    Router,
    routing::get,
    extract::{Path, State, Json},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use crate::api::error::ApiError;
use crate::error::{Error, Result};
use crate::observability::metrics;
use crate::price_infra::resolver::PriceResolver;
use crate::types::bucket::HourBucket;

pub const NOT_FOUND_MESSAGE: &str = "Price data unavailable.";

pub struct ApiState {
    pub resolver: Arc<PriceResolver>,
}

pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(export_metrics))
        .route("/api/price/:timestamp", get(get_price))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn export_metrics() -> std::result::Result<String, StatusCode> {
    metrics::render().map_err(|e| {
        tracing::error!("Failed to render metrics: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct PriceResponse {
    pub timestamp: String,
    pub price: f64,
}

async fn get_price(
    State(state): State<Arc<ApiState>>,
    Path(raw): Path<String>,
) -> std::result::Result<Json<PriceResponse>, ApiError> {
    let timestamp = parse_timestamp(&raw)?;
    let bucket = HourBucket::from_timestamp(&timestamp);
    tracing::info!("Fetching price for timestamp {} (bucket {})", timestamp, bucket);

    match state.resolver.resolve_bucket(bucket).await? {
        Some(price) => {
            tracing::info!("Returning price {} for bucket {}", price, bucket);
            Ok(Json(PriceResponse {
                timestamp: bucket.to_string(),
                price,
            }))
        }
        None => {
            tracing::warn!("Price data not found for bucket {}", bucket);
            Err(ApiError::NotFound(NOT_FOUND_MESSAGE.to_string()))
        }
    }
}

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Accepts RFC 3339, offset-less date-times (taken as UTC), plain dates, or unix seconds.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    raw.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| Error::InvalidTimestamp(raw.to_string()))
}
