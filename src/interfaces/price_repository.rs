use async_trait::async_trait;
use crate::error::Result;
use crate::types::bucket::HourBucket;
use crate::types::sample::PriceSample;

/// Durable record of resolved hours. The single source of truth for a bucket.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceRepository: Send + Sync {
    /// Exact-match lookup on the hour bucket.
    async fn find_by_bucket(&self, bucket: HourBucket) -> Result<Option<PriceSample>>;

    /// Persists `sample` unless its bucket is already stored, and returns the
    /// sample that is actually stored for the bucket. Concurrent appends for
    /// the same bucket all observe the first writer's value.
    async fn append(&self, sample: PriceSample) -> Result<PriceSample>;
}
