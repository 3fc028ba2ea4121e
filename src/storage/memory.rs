use async_trait::async_trait;
use dashmap::DashMap;
use crate::error::Result;
use crate::interfaces::price_repository::PriceRepository;
use crate::types::bucket::HourBucket;
use crate::types::sample::PriceSample;

/// Non-durable repository, for tests and throwaway runs.
#[derive(Default)]
pub struct InMemoryPriceRepository {
    samples: DashMap<HourBucket, f64>,
}

impl InMemoryPriceRepository {
    pub fn new() -> Self {
        InMemoryPriceRepository {
            samples: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[async_trait]
impl PriceRepository for InMemoryPriceRepository {
    async fn find_by_bucket(&self, bucket: HourBucket) -> Result<Option<PriceSample>> {
        Ok(self.samples.get(&bucket).map(|price| PriceSample::new(bucket, *price)))
    }

    async fn append(&self, sample: PriceSample) -> Result<PriceSample> {
        let stored = *self.samples
            .entry(sample.bucket)
            .or_insert(sample.aggregated_price);
        Ok(PriceSample::new(sample.bucket, stored))
    }
}
