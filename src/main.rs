use std::sync::Arc;
use anyhow::Context;
use price_aggregator::api::rest::{create_router, ApiState};
use price_aggregator::config::AppConfig;
use price_aggregator::observability::metrics::register_metrics;
use price_aggregator::observability::tracing::init_tracing;
use price_aggregator::price_infra::cache::PriceCache;
use price_aggregator::price_infra::connectors::http::HttpPriceConnector;
use price_aggregator::price_infra::resolver::PriceResolver;
use price_aggregator::price_infra::sweeper::CacheSweeper;
use price_aggregator::storage::SqlitePriceRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env).context("loading configuration")?;

    init_tracing(&config.logging);
    register_metrics()?;

    let repository = SqlitePriceRepository::connect(&config.database.url)
        .await
        .context("opening price store")?;
    let connector = HttpPriceConnector::new(config.upstream.timeout())?;
    let cache = Arc::new(PriceCache::new());

    let resolver = PriceResolver::new(
        config.enabled_sources(),
        Arc::new(connector),
        Arc::new(repository),
        Arc::clone(&cache),
    )?
        .with_asset(&config.asset)
        .with_cache_ttl(config.cache.ttl());

    tokio::spawn(CacheSweeper::new(cache, config.cache.sweep_interval()).run());

    let app = create_router(Arc::new(ApiState {
        resolver: Arc::new(resolver),
    }));

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    tracing::info!(env = %env, "Price aggregator listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
