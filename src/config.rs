use crate::connection::RetryPolicy;
use crate::env::{
    LOGSTASH_HOST_ENV, LOGSTASH_QUEUE_CAPACITY_ENV, LOGSTASH_RECONNECT_ATTEMPTS_ENV,
};
use std::str::FromStr;
use tokio::time::Duration;

/// Startup configuration of the generator.
///
/// Only the collector address comes from the outside by necessity; the
/// remaining knobs are optional and off by default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Collector address (`host:port`). Empty when not provided; the
    /// connection manager rejects it.
    pub collector_addr: String,
    /// Policy for the initial connection.
    pub connect: RetryPolicy,
    /// Policy for reconnecting after a failed write, if enabled.
    pub reconnect: Option<RetryPolicy>,
    /// Capacity of the single-writer queue, if enabled.
    pub queue_capacity: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            collector_addr: String::new(),
            connect: RetryPolicy::default(),
            reconnect: None,
            queue_capacity: None,
        }
    }
}

/// Error returned when an optional setting holds an unusable value.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidNumber { key: &'static str, value: String },
}

impl GeneratorConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = GeneratorConfig {
            collector_addr: lookup(LOGSTASH_HOST_ENV).unwrap_or_default().trim().to_string(),
            ..Default::default()
        };

        let reconnect_attempts: u32 =
            parse_optional(&lookup, LOGSTASH_RECONNECT_ATTEMPTS_ENV)?.unwrap_or(0);
        if reconnect_attempts > 0 {
            config.reconnect = Some(RetryPolicy::new(reconnect_attempts, Duration::from_secs(1)));
        }

        config.queue_capacity = parse_optional(&lookup, LOGSTASH_QUEUE_CAPACITY_ENV)?;
        Ok(config)
    }
}

fn parse_optional<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
    }
}
