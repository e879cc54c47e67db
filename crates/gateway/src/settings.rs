//! Gateway configuration
//!
//! Settings are layered: an optional TOML file, then environment variables
//! prefixed with `GATEWAY` (nested keys separated by `__`). The same
//! `config::Config` also carries the `[[providers]]` list read by
//! `ProviderRegistry::from_config`.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use core_kernel::GatewayError;
use domain_claims::{ClaimValidator, DEFAULT_CLAIM_AMOUNT_CEILING};
use edi_x12::{Submitter, UsageIndicator};
use infra_http::{BackoffKind, ClientConfig, RetryPolicy};

/// Environment variable naming the settings file
pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG";

pub const DEFAULT_CONFIG_PATH: &str = "config/gateway.toml";

/// Global gateway settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Per-attempt deadline for payer calls
    pub timeout_seconds: f64,
    /// Total attempts per call, the first one included
    pub max_retries: u32,
    /// Fixed delay, or the first delay of an exponential schedule
    pub retry_backoff_seconds: f64,
    pub backoff: BackoffKind,
    pub max_backoff_seconds: f64,
    /// Hard upper bound on a claim total
    pub claim_amount_ceiling: Decimal,
    pub pool_max_idle_per_host: usize,
    /// Concurrent health probes; defaults to the pool size
    pub probe_concurrency: Option<usize>,
    /// ISA06 / GS02 submitter id
    pub sender_id: String,
    pub sender_name: String,
    pub usage_indicator: UsageIndicator,
    pub log_level: String,
    /// `pretty` or `json`
    pub log_format: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 30.0,
            max_retries: 3,
            retry_backoff_seconds: 5.0,
            backoff: BackoffKind::Exponential,
            max_backoff_seconds: 60.0,
            claim_amount_ceiling: DEFAULT_CLAIM_AMOUNT_CEILING,
            pool_max_idle_per_host: 10,
            probe_concurrency: None,
            sender_id: "GATEWAY".to_string(),
            sender_name: "Hospital Gateway".to_string(),
            usage_indicator: UsageIndicator::Test,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl GatewaySettings {
    /// Builds the layered configuration
    ///
    /// `path` overrides `GATEWAY_CONFIG`; a missing file is not an error.
    pub fn load_config(path: Option<&str>) -> Result<config::Config, GatewayError> {
        let path = match path {
            Some(path) => path.to_string(),
            None => std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
        };

        config::Config::builder()
            .add_source(config::File::with_name(&path).required(false))
            .add_source(
                config::Environment::with_prefix("GATEWAY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| GatewayError::configuration(format!("cannot load configuration: {e}")))
    }

    /// Reads and checks the settings from a loaded configuration
    pub fn from_config(config: &config::Config) -> Result<Self, GatewayError> {
        let settings: Self = config
            .clone()
            .try_deserialize()
            .map_err(|e| GatewayError::configuration(format!("invalid gateway settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        let seconds = [
            ("timeout_seconds", self.timeout_seconds),
            ("retry_backoff_seconds", self.retry_backoff_seconds),
            ("max_backoff_seconds", self.max_backoff_seconds),
        ];
        for (name, value) in seconds {
            if !value.is_finite() || value < 0.0 {
                return Err(GatewayError::configuration(format!(
                    "{name} must be a non-negative number of seconds, got {value}"
                )));
            }
        }
        if self.timeout_seconds == 0.0 {
            return Err(GatewayError::configuration("timeout_seconds must be positive"));
        }
        if self.max_retries == 0 {
            return Err(GatewayError::configuration("max_retries must be at least 1"));
        }
        if self.claim_amount_ceiling <= Decimal::ZERO {
            return Err(GatewayError::configuration("claim_amount_ceiling must be positive"));
        }
        if self.probe_concurrency == Some(0) {
            return Err(GatewayError::configuration("probe_concurrency must be at least 1"));
        }
        if self.sender_id.trim().is_empty() {
            return Err(GatewayError::configuration("sender_id is required"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        seconds(self.timeout_seconds)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_settings(
            self.max_retries,
            self.backoff,
            seconds(self.retry_backoff_seconds),
            seconds(self.max_backoff_seconds),
        )
    }

    /// Client options; the reqwest-level timeout sits just above the
    /// per-attempt deadline so the latter always fires first
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .request_timeout(self.timeout() + Duration::from_secs(1))
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
    }

    pub fn submitter(&self) -> Submitter {
        Submitter::new(self.sender_id.trim(), self.sender_name.trim()).with_usage(self.usage_indicator)
    }

    pub fn claim_validator(&self) -> ClaimValidator {
        ClaimValidator::new(self.claim_amount_ceiling)
    }

    pub fn probe_concurrency(&self) -> usize {
        self.probe_concurrency.unwrap_or(self.pool_max_idle_per_host).max(1)
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}
