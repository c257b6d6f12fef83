//! Configuration management for the sweeper.
//!
//! Layers, lowest to highest priority: serde defaults, an optional TOML file,
//! then `SWEEPER__`-prefixed environment variables (`SWEEPER__DIRECTUS__TOKEN`).
//! A `.env` file in the working directory is loaded first when present.

use crate::reconcile::{ReconcileOptions, RetryPolicy};
use crate::sweep::CheckErrorPolicy;
use crate::utils::errors::{Result, SweeperError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// File looked up in the working directory when no `--config` is given.
const DEFAULT_CONFIG_NAME: &str = "directus-sweeper";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub directus: DirectusConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectusConfig {
    /// Base URL of the Directus instance
    pub url: String,

    /// Static admin token sent as a bearer credential
    pub token: String,

    /// Timeout for asset existence checks
    #[serde(default = "default_head_timeout_secs")]
    pub head_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Concurrent existence checks per batch
    #[serde(default = "default_check_batch_size")]
    pub check_batch_size: usize,

    /// Concurrent deletes per batch
    #[serde(default = "default_delete_batch_size")]
    pub delete_batch_size: usize,

    /// Pause between batches
    #[serde(default = "default_inter_batch_delay_ms")]
    pub inter_batch_delay_ms: u64,

    /// Upper bound on any single probe; 0 disables the bound
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Extra rounds for records with transient failures
    #[serde(default)]
    pub max_retries: u32,

    /// Backoff before the first retry round, doubled each round
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// What a failed existence check means (skip or orphan)
    #[serde(default)]
    pub on_check_error: CheckErrorPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Operator abort window before live deletion
    #[serde(default = "default_confirm_delay_secs")]
    pub confirm_delay_secs: u64,

    /// Orphans listed in the plan
    #[serde(default = "default_plan_listing_cap")]
    pub plan_listing_cap: usize,

    /// Failures listed in the final summary
    #[serde(default = "default_failure_listing_cap")]
    pub failure_listing_cap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_head_timeout_secs() -> u64 {
    5
}

fn default_check_batch_size() -> usize {
    10
}

fn default_delete_batch_size() -> usize {
    20
}

fn default_inter_batch_delay_ms() -> u64 {
    100
}

fn default_probe_timeout_secs() -> u64 {
    30
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_confirm_delay_secs() -> u64 {
    5
}

fn default_plan_listing_cap() -> usize {
    50
}

fn default_failure_listing_cap() -> usize {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            check_batch_size: default_check_batch_size(),
            delete_batch_size: default_delete_batch_size(),
            inter_batch_delay_ms: default_inter_batch_delay_ms(),
            probe_timeout_secs: default_probe_timeout_secs(),
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            on_check_error: CheckErrorPolicy::default(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            confirm_delay_secs: default_confirm_delay_secs(),
            plan_listing_cap: default_plan_listing_cap(),
            failure_listing_cap: default_failure_listing_cap(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// An explicit `path` must exist; the implicit `directus-sweeper.toml` may not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let file = match path {
            Some(path) => ::config::File::from(path).required(true),
            None => ::config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let config: Config = ::config::Config::builder()
            .add_source(file)
            .add_source(
                ::config::Environment::with_prefix("SWEEPER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.directus.url.trim().is_empty() {
            return Err(SweeperError::Config("directus.url must not be empty".into()));
        }
        if self.directus.token.trim().is_empty() {
            return Err(SweeperError::Config("directus.token must not be empty".into()));
        }
        if self.reconcile.check_batch_size == 0 || self.reconcile.delete_batch_size == 0 {
            return Err(SweeperError::Config("batch sizes must be at least 1".into()));
        }
        Ok(())
    }
}

impl DirectusConfig {
    pub fn head_timeout(&self) -> Duration {
        Duration::from_secs(self.head_timeout_secs)
    }
}

impl ReconcileConfig {
    /// Options for the existence-check pass
    pub fn check_options(&self) -> ReconcileOptions {
        self.options(self.check_batch_size)
    }

    /// Options for the delete pass
    pub fn delete_options(&self) -> ReconcileOptions {
        self.options(self.delete_batch_size)
    }

    fn options(&self, batch_size: usize) -> ReconcileOptions {
        ReconcileOptions {
            batch_size,
            inter_batch_delay: Duration::from_millis(self.inter_batch_delay_ms),
            probe_timeout: (self.probe_timeout_secs > 0)
                .then(|| Duration::from_secs(self.probe_timeout_secs)),
            retry: RetryPolicy::exponential(
                self.max_retries,
                Duration::from_millis(self.retry_backoff_ms),
            ),
        }
    }
}

impl SweepConfig {
    pub fn confirm_delay(&self) -> Duration {
        Duration::from_secs(self.confirm_delay_secs)
    }
}
