use std::str::FromStr;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use crate::error::{Error, Result};
use crate::interfaces::price_repository::PriceRepository;
use crate::types::bucket::HourBucket;
use crate::types::sample::PriceSample;

const CREATE_PRICE_SAMPLES: &str = "
    CREATE TABLE IF NOT EXISTS price_samples (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        bucket_ts        INTEGER NOT NULL UNIQUE,
        aggregated_price REAL    NOT NULL
    )";

/// SQLite-backed repository.
///
/// ## Schema
/// - `bucket_ts`: unix seconds of the UTC hour start, unique
/// - `aggregated_price`: the two-source mean stored for that hour
///
/// The table is created on connect if it does not exist yet.
///
/// ## Concurrency
/// Appends go through `INSERT OR IGNORE` against the unique bucket column, so
/// racing resolvers for the same hour cannot create two rows. The losing
/// writer reads back and returns the winner's sample.
pub struct SqlitePriceRepository {
    pool: SqlitePool,
}

impl SqlitePriceRepository {
    /// Opens (creating if missing) the database at `url`, e.g. `sqlite://prices.db`.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        tracing::info!("Connected to price store at {}", url);
        Self::with_pool(pool).await
    }

    /// Private in-memory database. Pinned to one connection that never idles
    /// out, since every SQLite `:memory:` connection is a separate database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(CREATE_PRICE_SAMPLES)
            .execute(&pool)
            .await?;
        Ok(SqlitePriceRepository { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl PriceRepository for SqlitePriceRepository {
    async fn find_by_bucket(&self, bucket: HourBucket) -> Result<Option<PriceSample>> {
        let price: Option<f64> = sqlx::query_scalar(
            "SELECT aggregated_price FROM price_samples WHERE bucket_ts = ?",
        )
            .bind(bucket.unix_seconds())
            .fetch_optional(&self.pool)
            .await?;

        Ok(price.map(|p| PriceSample::new(bucket, p)))
    }

    async fn append(&self, sample: PriceSample) -> Result<PriceSample> {
        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO price_samples (bucket_ts, aggregated_price) VALUES (?, ?)",
        )
            .bind(sample.bucket.unix_seconds())
            .bind(sample.aggregated_price)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if inserted == 0 {
            tracing::info!("Sample for {} already stored, keeping existing value", sample.bucket);
        }

        self.find_by_bucket(sample.bucket)
            .await?
            .ok_or_else(|| Error::Storage(format!("sample for {} missing after append", sample.bucket)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn bucket(hour: u32) -> HourBucket {
        HourBucket::from_timestamp(&Utc.with_ymd_and_hms(2024, 3, 15, hour, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn lookup_misses_on_empty_store() {
        let repo = SqlitePriceRepository::in_memory().await.unwrap();
        assert_eq!(repo.find_by_bucket(bucket(14)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn append_then_exact_lookup() {
        let repo = SqlitePriceRepository::in_memory().await.unwrap();
        let stored = repo.append(PriceSample::new(bucket(14), 45100.0)).await.unwrap();
        assert_eq!(stored.aggregated_price, 45100.0);

        let found = repo.find_by_bucket(bucket(14)).await.unwrap().unwrap();
        assert_eq!(found, PriceSample::new(bucket(14), 45100.0));

        // Neighbouring hours are distinct buckets
        assert_eq!(repo.find_by_bucket(bucket(13)).await.unwrap(), None);
        assert_eq!(repo.find_by_bucket(bucket(15)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_append_returns_stored_sample() {
        let repo = SqlitePriceRepository::in_memory().await.unwrap();
        repo.append(PriceSample::new(bucket(14), 45100.0)).await.unwrap();

        let second = repo.append(PriceSample::new(bucket(14), 45099.5)).await.unwrap();

        assert_eq!(second.aggregated_price, 45100.0);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM price_samples")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn samples_survive_reconnect() {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let path = std::env::temp_dir().join(format!("price_store_{}_{}.db", std::process::id(), nanos));
        let url = format!("sqlite://{}", path.display());

        let repo = SqlitePriceRepository::connect(&url).await.unwrap();
        repo.append(PriceSample::new(bucket(9), 61000.25)).await.unwrap();
        repo.close().await;

        let reopened = SqlitePriceRepository::connect(&url).await.unwrap();
        let found = reopened.find_by_bucket(bucket(9)).await.unwrap().unwrap();
        assert_eq!(found.aggregated_price, 61000.25);
        reopened.close().await;

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn closed_pool_surfaces_storage_fault() {
        let repo = SqlitePriceRepository::in_memory().await.unwrap();
        repo.close().await;

        let lookup = repo.find_by_bucket(bucket(14)).await;
        let append = repo.append(PriceSample::new(bucket(14), 1.0)).await;

        assert!(matches!(lookup, Err(Error::Storage(_))));
        assert!(matches!(append, Err(Error::Storage(_))));
    }
}
