//! Provider health probe binary
//!
//! Loads the gateway configuration, probes every configured payer once and
//! prints the resulting report as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! # Probe the payers in config/gateway.toml
//! cargo run --bin provider-health
//!
//! # Use another file and JSON logs
//! GATEWAY_CONFIG=/etc/gateway/prod.toml GATEWAY__LOG_FORMAT=json cargo run --bin provider-health
//! ```
//!
//! # Exit status
//!
//! `0` when at least one provider can take traffic, `1` otherwise.

use anyhow::Context;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gateway::{GatewaySettings, InsuranceGateway};
use payer_registry::ProviderRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let config = GatewaySettings::load_config(None).context("loading configuration")?;
    let settings = GatewaySettings::from_config(&config).context("reading gateway settings")?;

    init_tracing(&settings.log_level, &settings.log_format);

    let registry = ProviderRegistry::from_config(&config).context("loading provider definitions")?;
    tracing::info!(providers = registry.len(), "Probing providers");

    let gateway = InsuranceGateway::start(settings, Arc::new(registry)).context("starting gateway")?;
    let report = gateway.probe_all().await;
    gateway.shutdown();

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.is_operational() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!(overall = ?report.overall_status, "No provider is operational");
        Ok(ExitCode::FAILURE)
    }
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(log_level: &str, log_format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
