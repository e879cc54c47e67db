//! Provider health types
//!
//! Health probes run a lightweight synthetic call against each payer. The
//! per-provider results roll up into a `HealthReport` that the caller's own
//! health endpoint can serve as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::ProviderId;

/// Health status for a payer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Payer answered the probe successfully
    Healthy,
    /// Payer is reachable but rejected the synthetic request
    Degraded,
    /// Payer is unreachable or misconfigured
    Unhealthy,
    /// Provider is inactive and was not probed
    Unknown,
}

/// Health check result for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub provider_id: ProviderId,
    pub status: HealthStatus,
    /// Wall-clock latency of the probe in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn new(provider_id: ProviderId, status: HealthStatus, latency_ms: u64) -> Self {
        Self {
            provider_id,
            status,
            latency_ms,
            message: None,
            checked_at: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Aggregate of health checks across all probed providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub results: Vec<HealthCheckResult>,
    pub healthy_count: usize,
    pub degraded_count: usize,
    pub unhealthy_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl HealthReport {
    /// Builds a report from individual results
    ///
    /// The overall status is `Healthy` only when every probed provider is
    /// healthy, `Unhealthy` when none is reachable, `Degraded` otherwise.
    /// Providers reported as `Unknown` do not influence the overall status.
    pub fn from_results(mut results: Vec<HealthCheckResult>) -> Self {
        results.sort_by(|a, b| a.provider_id.cmp(&b.provider_id));

        let count = |status: HealthStatus| results.iter().filter(|r| r.status == status).count();
        let healthy_count = count(HealthStatus::Healthy);
        let degraded_count = count(HealthStatus::Degraded);
        let unhealthy_count = count(HealthStatus::Unhealthy);
        let probed = healthy_count + degraded_count + unhealthy_count;

        let overall_status = if probed == 0 {
            HealthStatus::Unknown
        } else if healthy_count == probed {
            HealthStatus::Healthy
        } else if healthy_count + degraded_count == 0 {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        };

        Self {
            overall_status,
            results,
            healthy_count,
            degraded_count,
            unhealthy_count,
            generated_at: Utc::now(),
        }
    }

    /// Returns true if all probed providers are healthy
    pub fn is_fully_healthy(&self) -> bool {
        self.overall_status == HealthStatus::Healthy
    }

    /// Returns true if at least one provider can take traffic
    pub fn is_operational(&self) -> bool {
        matches!(
            self.overall_status,
            HealthStatus::Healthy | HealthStatus::Degraded
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, status: HealthStatus) -> HealthCheckResult {
        HealthCheckResult::new(ProviderId::new(id).unwrap(), status, 12)
    }

    #[test]
    fn test_all_healthy() {
        let report = HealthReport::from_results(vec![
            result("a", HealthStatus::Healthy),
            result("b", HealthStatus::Healthy),
        ]);
        assert!(report.is_fully_healthy());
        assert!(report.is_operational());
        assert_eq!(report.healthy_count, 2);
    }

    #[test]
    fn test_degraded_when_mixed() {
        let report = HealthReport::from_results(vec![
            result("a", HealthStatus::Healthy),
            result("b", HealthStatus::Unhealthy),
        ]);
        assert_eq!(report.overall_status, HealthStatus::Degraded);
        assert!(report.is_operational());
    }

    #[test]
    fn test_unhealthy_when_nothing_reachable() {
        let report = HealthReport::from_results(vec![
            result("a", HealthStatus::Unhealthy),
            result("b", HealthStatus::Unknown),
        ]);
        assert_eq!(report.overall_status, HealthStatus::Unhealthy);
        assert!(!report.is_operational());
    }

    #[test]
    fn test_results_sorted_by_provider() {
        let report = HealthReport::from_results(vec![
            result("zeta", HealthStatus::Healthy),
            result("alpha", HealthStatus::Healthy),
        ]);
        assert_eq!(report.results[0].provider_id.as_str(), "alpha");
    }

    #[test]
    fn test_empty_report_is_unknown() {
        let report = HealthReport::from_results(Vec::new());
        assert_eq!(report.overall_status, HealthStatus::Unknown);
        assert!(!report.is_operational());
    }
}
