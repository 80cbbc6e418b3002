// Service configuration, from defaults, JSON, or RESERVATION_* environment variables

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::cache::{CacheConfig, EvictionPolicy};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

// How bookings for the same hotel coordinate with each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyMode {
    // Read-check-write without coordination. Concurrent bookings can overbook.
    #[default]
    Racy,
    // One request at a time per hotel within this process
    Serialized,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub consistency: ConsistencyMode,
    pub cache: CacheConfig,
}

pub const ENV_CONSISTENCY: &str = "RESERVATION_CONSISTENCY";
pub const ENV_CACHE_MAX_ENTRIES: &str = "RESERVATION_CACHE_MAX_ENTRIES";
pub const ENV_CACHE_TTL_SECONDS: &str = "RESERVATION_CACHE_TTL_SECONDS";
pub const ENV_CACHE_SHARDS: &str = "RESERVATION_CACHE_SHARDS";
pub const ENV_CACHE_EVICTION: &str = "RESERVATION_CACHE_EVICTION";
pub const ENV_CAPACITY_FILE: &str = "RESERVATION_CAPACITY_FILE";

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = vars.get(ENV_CONSISTENCY) {
            config.consistency = match value.to_ascii_lowercase().as_str() {
                "racy" => ConsistencyMode::Racy,
                "serialized" => ConsistencyMode::Serialized,
                _ => return Err(invalid(ENV_CONSISTENCY, value)),
            };
        }
        if let Some(value) = vars.get(ENV_CACHE_MAX_ENTRIES) {
            config.cache.max_entries = parse(ENV_CACHE_MAX_ENTRIES, value)?;
        }
        if let Some(value) = vars.get(ENV_CACHE_TTL_SECONDS) {
            // zero turns expiry off
            let secs: u64 = parse(ENV_CACHE_TTL_SECONDS, value)?;
            config.cache.default_ttl_seconds = (secs > 0).then_some(secs);
        }
        if let Some(value) = vars.get(ENV_CACHE_SHARDS) {
            config.cache.shards_count = parse(ENV_CACHE_SHARDS, value)?;
        }
        if let Some(value) = vars.get(ENV_CACHE_EVICTION) {
            config.cache.eviction_policy = match value.to_ascii_lowercase().as_str() {
                "lru" => EvictionPolicy::LeastRecentlyUsed,
                "lfu" => EvictionPolicy::LeastFrequentlyUsed,
                _ => return Err(invalid(ENV_CACHE_EVICTION, value)),
            };
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
