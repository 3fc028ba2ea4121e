use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Timelike, Utc};
use std::fmt;

/// A UTC instant truncated to the start of its hour.
///
/// Every lookup, write and cache key in the resolution pipeline is derived
/// from this value, so two timestamps inside the same UTC hour always land on
/// the same bucket regardless of the offset or precision they arrived with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourBucket(DateTime<Utc>);

impl HourBucket {
    pub const SECONDS: i64 = 3600;

    pub fn from_timestamp<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> Self {
        let utc = timestamp.with_timezone(&Utc);
        let into_hour = Duration::seconds(i64::from(utc.minute() * 60 + utc.second()))
            + Duration::nanoseconds(i64::from(utc.nanosecond()));
        HourBucket(utc - into_hour)
    }

    /// Rebuilds a bucket from stored unix seconds. Unaligned values are truncated.
    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0).map(|t| Self::from_timestamp(&t))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn unix_seconds(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn next(&self) -> Self {
        HourBucket(self.0 + Duration::seconds(Self::SECONDS))
    }

    /// Cache key, e.g. `btc_price_2024031514`.
    pub fn cache_key(&self, asset: &str) -> String {
        format!("{}_price_{}", asset.to_lowercase(), self.0.format("%Y%m%d%H"))
    }
}

impl fmt::Display for HourBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}
