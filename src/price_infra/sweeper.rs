use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use crate::price_infra::cache::PriceCache;

/// Periodically drops expired cache entries so hours that are never asked for
/// again do not linger in memory.
pub struct CacheSweeper {
    cache: Arc<PriceCache>,
    interval: Duration,
}

impl CacheSweeper {
    pub fn new(cache: Arc<PriceCache>, interval: Duration) -> Self {
        CacheSweeper { cache, interval }
    }

    pub async fn run(self) {
        if self.interval.is_zero() {
            tracing::info!("Cache sweeping disabled");
            return;
        }

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let purged = self.cache.purge_expired();
            if purged > 0 {
                tracing::debug!("Purged {} expired cache entries, {} remaining", purged, self.cache.len());
            }
        }
    }
}
