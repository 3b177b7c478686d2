//! Grafana HTTP API adapter.
//!
//! Reads a dashboard by UID and upserts it back with overwrite semantics.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::DashboardService;
use crate::error::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Grafana HTTP API client
pub struct GrafanaClient {
    /// Base URL, without a trailing slash
    base_url: String,
    /// API token sent as a bearer credential
    token: Option<String>,
    /// UID of the managed dashboard
    dashboard_uid: String,
    /// HTTP client
    client: reqwest::Client,
}

impl GrafanaClient {
    /// Create a new Grafana client with the default request timeout
    pub fn new(base_url: &str, token: Option<String>, dashboard_uid: &str) -> Result<Self> {
        Self::with_timeout(base_url, token, dashboard_uid, DEFAULT_TIMEOUT)
    }

    /// Create a client whose requests give up after `request_timeout`
    pub fn with_timeout(
        base_url: &str,
        token: Option<String>,
        dashboard_uid: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            dashboard_uid: dashboard_uid.to_string(),
            client,
        })
    }

    /// Build API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn a non-2xx response into an error carrying the body
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::ExternalService {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DashboardService for GrafanaClient {
    fn name(&self) -> &str {
        "grafana"
    }

    async fn fetch(&self) -> Result<Value> {
        let url = self.api_url(&format!("dashboards/uid/{}", self.dashboard_uid));
        debug!(%url, "fetching dashboard");

        let response = self.authorize(self.client.get(&url)).send().await?;
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;

        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Validation(format!("dashboard response is not JSON: {}", e)))
    }

    async fn upsert(&self, dashboard: &Value) -> Result<()> {
        let url = self.api_url("dashboards/db");

        let response = self
            .authorize(self.client.post(&url))
            .json(&json!({
                "dashboard": dashboard,
                "overwrite": true,
            }))
            .send()
            .await?;
        Self::check_status(response).await?;

        info!(uid = %self.dashboard_uid, "dashboard applied");
        Ok(())
    }
}

/// Stand-in used when no Grafana URL is configured.
///
/// Lets history-only commands run; any call that needs the service fails.
pub struct UnconfiguredGrafana;

impl UnconfiguredGrafana {
    fn missing() -> Error {
        Error::Input("GRAFANA_URL is not set".to_string())
    }
}

#[async_trait]
impl DashboardService for UnconfiguredGrafana {
    fn name(&self) -> &str {
        "grafana (unconfigured)"
    }

    async fn fetch(&self) -> Result<Value> {
        Err(Self::missing())
    }

    async fn upsert(&self, _dashboard: &Value) -> Result<()> {
        Err(Self::missing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let client = GrafanaClient::new("http://grafana:3000/", None, "abc").unwrap();
        assert_eq!(
            client.api_url("dashboards/uid/abc"),
            "http://grafana:3000/api/dashboards/uid/abc"
        );
        assert_eq!(client.name(), "grafana");
    }

    #[tokio::test]
    async fn test_unconfigured_fails_with_input_error() {
        let err = UnconfiguredGrafana.fetch().await.unwrap_err();
        assert!(err.is_input());
        assert!(err.to_string().contains("GRAFANA_URL"));
    }
}
