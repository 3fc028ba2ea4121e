use crate::types::bucket::HourBucket;

/// One resolved price per hour bucket. Never mutated after it is persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceSample {
    pub bucket: HourBucket,
    pub aggregated_price: f64,
}

impl PriceSample {
    pub fn new(bucket: HourBucket, aggregated_price: f64) -> Self {
        PriceSample {
            bucket,
            aggregated_price,
        }
    }
}
