//! Process configuration, loaded from the environment (optionally via a
//! `.env` file) and an optional `config/server.toml` override.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub metadata_api_base_url: String,
    pub metadata_api_key: String,

    pub cache_ttl_seconds: u64,
    pub cache_capacity: usize,

    pub request_deadline_seconds: u64,

    #[serde(default)]
    pub populator: PopulatorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PopulatorConfig {
    pub enabled: bool,
    pub daily_interval_hours: u64,
    pub weekly_interval_hours: u64,
}

impl Default for PopulatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_interval_hours: 24,
            weekly_interval_hours: 24 * 7,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metadata_api_base_url: "https://api.themoviedb.org/3".to_string(),
            metadata_api_key: String::new(),
            cache_ttl_seconds: 5 * 60,
            cache_capacity: 100,
            request_deadline_seconds: 30,
            populator: PopulatorConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from (in ascending precedence) `config/server.toml`
    /// if present, then environment variables prefixed `RECS_`, then a local
    /// `.env` file loaded ahead of either source.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .add_source(
                config::Config::try_from(&Config::default())?,
            )
            .add_source(config::File::with_name("config/server").required(false))
            .add_source(config::Environment::with_prefix("RECS").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_seconds)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}
