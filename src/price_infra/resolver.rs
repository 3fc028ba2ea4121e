use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, TimeZone};
use tracing::Instrument;
use crate::error::{Error, Result};
use crate::interfaces::price_repository::PriceRepository;
use crate::observability::metrics::{
    CACHE_HITS, RESOLUTIONS_UNAVAILABLE, SAMPLES_PERSISTED, STORAGE_FAULTS, STORE_HITS,
    UPSTREAM_FETCH_FAILURES, UPSTREAM_FETCH_LATENCY,
};
use crate::observability::tracing::trace_resolution;
use crate::price_infra::aggregator::aggregate;
use crate::price_infra::cache::{PriceCache, DEFAULT_TTL};
use crate::price_infra::connectors::PriceConnector;
use crate::price_infra::{PriceSourceConfig, SourceQuote};
use crate::types::bucket::HourBucket;
use crate::types::sample::PriceSample;

/// Resolves one aggregated price per hour bucket.
///
/// Lookup order, each step short-circuiting the rest:
/// 1. cache
/// 2. repository (warms the cache on a hit)
/// 3. both upstream sources, fetched concurrently; the mean is appended to the
///    repository and then cached
///
/// If either source fails the whole resolution yields `None` and nothing is
/// written. Repository errors propagate as [`Error::Storage`].
///
/// Two first-time requests for the same hour may both reach step 3. The
/// repository keeps the first append, and the resolver always returns and
/// caches what the repository reports as stored.
pub struct PriceResolver {
    asset: String,
    sources: [PriceSourceConfig; 2],
    connector: Arc<dyn PriceConnector>,
    repository: Arc<dyn PriceRepository>,
    cache: Arc<PriceCache>,
    cache_ttl: Duration,
}

impl PriceResolver {
    pub fn new(
        sources: Vec<PriceSourceConfig>,
        connector: Arc<dyn PriceConnector>,
        repository: Arc<dyn PriceRepository>,
        cache: Arc<PriceCache>,
    ) -> Result<Self> {
        let sources: [PriceSourceConfig; 2] = sources
            .try_into()
            .map_err(|rejected: Vec<PriceSourceConfig>| Error::InvalidSourceCount(rejected.len()))?;

        Ok(PriceResolver {
            asset: "btc".to_string(),
            sources,
            connector,
            repository,
            cache,
            cache_ttl: DEFAULT_TTL,
        })
    }

    pub fn with_asset(mut self, asset: &str) -> Self {
        self.asset = asset.to_lowercase();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Price for the UTC hour containing `timestamp`, in any time zone.
    pub async fn resolve<Tz: TimeZone>(&self, timestamp: &DateTime<Tz>) -> Result<Option<f64>> {
        self.resolve_bucket(HourBucket::from_timestamp(timestamp)).await
    }

    pub async fn resolve_bucket(&self, bucket: HourBucket) -> Result<Option<f64>> {
        self.resolve_inner(bucket)
            .instrument(trace_resolution(&bucket))
            .await
    }

    async fn resolve_inner(&self, bucket: HourBucket) -> Result<Option<f64>> {
        let key = bucket.cache_key(&self.asset);

        if let Some(price) = self.cache.get(&key) {
            tracing::debug!("Serving from cache");
            CACHE_HITS.inc();
            return Ok(Some(price));
        }

        let stored = self.repository
            .find_by_bucket(bucket)
            .await
            .inspect_err(record_storage_fault)?;

        if let Some(sample) = stored {
            tracing::debug!("Serving from store, warming cache");
            STORE_HITS.inc();
            self.cache.put(&key, sample.aggregated_price, self.cache_ttl);
            return Ok(Some(sample.aggregated_price));
        }

        let Some(quotes) = self.fetch_quotes().await else {
            RESOLUTIONS_UNAVAILABLE.inc();
            return Ok(None);
        };

        let aggregated = match aggregate(&quotes) {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!("Discarding quotes: {}", e);
                RESOLUTIONS_UNAVAILABLE.inc();
                return Ok(None);
            }
        };
        let persisted = self.repository
            .append(PriceSample::new(bucket, aggregated))
            .await
            .inspect_err(record_storage_fault)?;

        SAMPLES_PERSISTED.inc();
        self.cache.put(&key, persisted.aggregated_price, self.cache_ttl);

        tracing::info!(
            price = persisted.aggregated_price,
            sources = ?quotes.iter().map(|q| (&q.source_id, q.price)).collect::<Vec<_>>(),
            "Resolved aggregated price"
        );
        Ok(Some(persisted.aggregated_price))
    }

    /// Both quotes, or `None` if any source failed. A lone surviving quote is discarded.
    async fn fetch_quotes(&self) -> Option<Vec<SourceQuote>> {
        let [primary, secondary] = &self.sources;

        let timer = UPSTREAM_FETCH_LATENCY.start_timer();
        let (first, second) = tokio::join!(
            self.connector.fetch(primary),
            self.connector.fetch(secondary),
        );
        timer.observe_duration();

        match (first, second) {
            (Ok(first), Ok(second)) => Some(vec![first, second]),
            (first, second) => {
                let failed: Vec<&str> = [(primary, first.is_err()), (secondary, second.is_err())]
                    .into_iter()
                    .filter(|(_, failed)| *failed)
                    .map(|(source, _)| source.source_id.as_str())
                    .collect();

                UPSTREAM_FETCH_FAILURES.inc_by(failed.len() as u64);
                tracing::warn!(failed = ?failed, "Price data unavailable, discarding partial quotes");
                None
            }
        }
    }
}

fn record_storage_fault(e: &Error) {
    STORAGE_FAULTS.inc();
    tracing::error!(error = %e, "Price store failed");
}
