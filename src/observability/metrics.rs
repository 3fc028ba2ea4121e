use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use crate::error::{Error, Result};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Resolution path metrics
    pub static ref CACHE_HITS: IntCounter = IntCounter::new(
        "price_cache_hits_total",
        "Resolutions served from the in-memory cache"
    ).expect("valid metric");

    pub static ref STORE_HITS: IntCounter = IntCounter::new(
        "price_store_hits_total",
        "Resolutions served from the persistent store"
    ).expect("valid metric");

    pub static ref SAMPLES_PERSISTED: IntCounter = IntCounter::new(
        "price_samples_persisted_total",
        "Aggregated samples appended to the persistent store"
    ).expect("valid metric");

    pub static ref RESOLUTIONS_UNAVAILABLE: IntCounter = IntCounter::new(
        "price_resolutions_unavailable_total",
        "Resolutions that ended without a price"
    ).expect("valid metric");

    pub static ref STORAGE_FAULTS: IntCounter = IntCounter::new(
        "price_storage_faults_total",
        "Resolutions aborted by a persistent store error"
    ).expect("valid metric");

    // Upstream metrics
    pub static ref UPSTREAM_FETCH_FAILURES: IntCounter = IntCounter::new(
        "price_upstream_fetch_failures_total",
        "Upstream fetches that returned no usable price"
    ).expect("valid metric");

    pub static ref UPSTREAM_FETCH_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "price_upstream_fetch_latency_seconds",
            "Latency of fetching both upstream sources"
        ).buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])
    ).expect("valid metric");
}

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(CACHE_HITS.clone()))?;
    REGISTRY.register(Box::new(STORE_HITS.clone()))?;
    REGISTRY.register(Box::new(SAMPLES_PERSISTED.clone()))?;
    REGISTRY.register(Box::new(RESOLUTIONS_UNAVAILABLE.clone()))?;
    REGISTRY.register(Box::new(STORAGE_FAULTS.clone()))?;
    REGISTRY.register(Box::new(UPSTREAM_FETCH_FAILURES.clone()))?;
    REGISTRY.register(Box::new(UPSTREAM_FETCH_LATENCY.clone()))?;
    Ok(())
}

/// Prometheus text exposition of everything in [`REGISTRY`].
pub fn render() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| Error::MetricsError(e.to_string()))
}
