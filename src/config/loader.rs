use crate::config::*;
use crate::error::{Error, Result};
use crate::price_infra::aggregator::REQUIRED_QUOTES;
use crate::price_infra::PriceSourceConfig;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use config::builder::DefaultState;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub asset: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub upstream: UpstreamConfig,
    pub logging: LoggingConfig,
    pub price_sources: Vec<PriceSourceConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            asset: "btc".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            upstream: UpstreamConfig::default(),
            logging: LoggingConfig::default(),
            price_sources: PriceSourceConfig::defaults(),
        }
    }
}

impl AppConfig {
    /// Layers `config/default`, `config/{env}` and `PRICEAGG__*` variables.
    pub fn load(env: &str) -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("PRICEAGG").separator("__"));

        Self::build(builder)
    }

    pub fn from_toml(toml: &str) -> Result<Self> {
        Self::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config: AppConfig = builder
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?
            .try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn enabled_sources(&self) -> Vec<PriceSourceConfig> {
        self.price_sources.iter()
            .filter(|s| s.enabled)
            .cloned()
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.asset.trim().is_empty() {
            return Err(Error::ConfigError("asset must not be empty".to_string()));
        }
        if self.cache.ttl_secs == 0 {
            return Err(Error::ConfigError("cache.ttl_secs must be positive".to_string()));
        }
        if self.upstream.timeout_ms == 0 {
            return Err(Error::ConfigError("upstream.timeout_ms must be positive".to_string()));
        }

        let enabled = self.enabled_sources().len();
        if enabled != REQUIRED_QUOTES {
            return Err(Error::InvalidSourceCount(enabled));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_infra::ResponseShape;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.asset, "btc");
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.enabled_sources(), PriceSourceConfig::defaults());
    }

    #[test]
    fn reads_sections_and_sources() {
        let config = AppConfig::from_toml(r#"
            asset = "btc"

            [server]
            port = 9090

            [upstream]
            timeout_ms = 2500

            [[price_sources]]
            source_id = "a"
            url = "http://localhost:1/a"
            shape = "bitstamp"

            [[price_sources]]
            source_id = "b"
            url = "http://localhost:1/b"
            shape = "bitfinex"
        "#).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.upstream.timeout().as_millis(), 2500);
        assert_eq!(config.price_sources[1].shape, ResponseShape::Bitfinex);
        assert!(config.price_sources[0].enabled);
    }

    #[test]
    fn rejects_single_enabled_source() {
        let result = AppConfig::from_toml(r#"
            [[price_sources]]
            source_id = "a"
            url = "http://localhost:1/a"
            shape = "bitstamp"

            [[price_sources]]
            source_id = "b"
            url = "http://localhost:1/b"
            shape = "bitfinex"
            enabled = false
        "#);

        assert!(matches!(result, Err(Error::InvalidSourceCount(1))));
    }

    #[test]
    fn rejects_unknown_shape() {
        let result = AppConfig::from_toml(r#"
            [[price_sources]]
            source_id = "a"
            url = "http://localhost:1/a"
            shape = "kraken"
        "#);

        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn rejects_zero_ttl() {
        let result = AppConfig::from_toml("[cache]\nttl_secs = 0\n");
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }
}
