//! # Application Configuration
//!
//! [`AppConfig`] bundles the framework configs the sample needs. It
//! deserializes with `serde` for embedding in a larger config, or is read from
//! `FLOW_*` environment variables by [`AppConfig::from_env`]:
//!
//! | Variable                  | Field                        | Default |
//! |---------------------------|------------------------------|---------|
//! | `FLOW_MAILBOX_CAPACITY`   | `ledger.mailbox_capacity`    | 32      |
//! | `FLOW_REQUEST_TIMEOUT_MS` | `ledger.request_timeout`     | none    |
//! | `FLOW_CHANNEL_CAPACITY`   | `pipeline.channel_capacity`  | 16      |
//! | `FLOW_DIGEST_WORKERS`     | `digest_workers`             | 4       |
//! | `FLOW_FAIL_FAST`          | `pipeline.failure_policy`    | false   |
//!
//! Unset variables keep their default; a variable that does not parse is an
//! error rather than silently ignored.

use flow_framework::{ActorConfig, FailurePolicy, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ledger: ActorConfig,
    pub pipeline: PipelineConfig,
    /// Parallel file readers in the digest stage.
    pub digest_workers: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ledger: ActorConfig::named("ledger"),
            pipeline: PipelineConfig::default(),
            digest_workers: 4,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(capacity) = parse(&lookup, "FLOW_MAILBOX_CAPACITY")? {
            config.ledger.mailbox_capacity = capacity;
        }
        if let Some(millis) = parse::<u64, _>(&lookup, "FLOW_REQUEST_TIMEOUT_MS")? {
            config.ledger.request_timeout = Some(Duration::from_millis(millis));
        }
        if let Some(capacity) = parse(&lookup, "FLOW_CHANNEL_CAPACITY")? {
            config.pipeline.channel_capacity = capacity;
        }
        if let Some(workers) = parse(&lookup, "FLOW_DIGEST_WORKERS")? {
            config.digest_workers = workers;
        }
        if let Some(fail_fast) = parse_flag(&lookup, "FLOW_FAIL_FAST")? {
            config.pipeline.failure_policy = if fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::Forward
            };
        }
        Ok(config)
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => Err(ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_flag<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}
