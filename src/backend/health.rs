//! Component health checks

use super::client::BackendClient;
use crate::resource::Component;
use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;

/// Fixed deadline for health probes, independent of the request timeout
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of probing one component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub component: Component,
    pub url: String,
}

impl BackendClient {
    /// Probe `<base>/health`. Never fails: network errors become `healthy: false`.
    pub async fn check_health(&self, component: Component) -> HealthStatus {
        let url = format!("{}/health", self.base_url(component).trim_end_matches('/'));

        let result = self
            .http
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    tracing::warn!("{} health check returned {}", component, status);
                }
                HealthStatus {
                    healthy: status.is_success(),
                    status: Some(status.as_u16()),
                    error: None,
                    component,
                    url,
                }
            }
            Err(e) => {
                tracing::warn!("{} health check failed: {}", component, e);
                HealthStatus {
                    healthy: false,
                    status: None,
                    error: Some(e.to_string()),
                    component,
                    url,
                }
            }
        }
    }

    /// Probe every component concurrently, in component order
    pub async fn check_all_health(&self) -> Vec<HealthStatus> {
        join_all(Component::ALL.iter().map(|c| self.check_health(*c))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_unreachable_host_reports_unhealthy() {
        let config = Config {
            onboarding_url: "http://127.0.0.1:1".into(),
            ..Default::default()
        };
        let client = BackendClient::new(config).unwrap();

        let status = tokio_test::block_on(client.check_health(Component::Onboarding));

        assert!(!status.healthy);
        assert!(status.status.is_none());
        assert!(status.error.is_some());
        assert_eq!(status.url, "http://127.0.0.1:1/health");
    }
}
