//! Backend Client
//!
//! Main client for the Midaz backends, combining the resolved configuration
//! with a shared HTTP connection pool.

use super::http::{interpret_response, network_failure};
use crate::config::Config;
use crate::error::DispatchError;
use crate::resource::{build_query_string, build_url, Component, HttpMethod};
use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Header used to correlate a call with backend logs
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// One concrete backend call, produced from a resolved action
#[derive(Debug, Clone, Copy)]
pub struct BackendRequest<'a> {
    pub component: Component,
    pub method: HttpMethod,
    pub path_template: &'a str,
    pub path_params: &'a Map<String, Value>,
    pub query_params: &'a Map<String, Value>,
    pub body: Option<&'a Value>,
}

/// Main Midaz backend client
#[derive(Clone)]
pub struct BackendClient {
    pub config: Config,
    pub(crate) http: Client,
}

impl BackendClient {
    /// Create a new backend client
    pub fn new(config: Config) -> Result<Self> {
        let http = Client::builder()
            .user_agent(format!("midaz-mcp/{}", crate::VERSION))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, http })
    }

    /// Base URL of a component
    pub fn base_url(&self, component: Component) -> &str {
        self.config.component_url(component)
    }

    /// Issue a request against the component that serves it.
    ///
    /// The configured timeout bounds the whole call; on expiry the request is
    /// aborted and surfaces as a timeout failure. Nothing is retried.
    pub async fn execute_request(&self, request: BackendRequest<'_>) -> Result<Value, DispatchError> {
        let base_url = self.base_url(request.component);
        let url = format!(
            "{}{}",
            build_url(base_url, request.path_template, request.path_params)?,
            build_query_string(request.query_params)
        );

        let request_id = Uuid::new_v4().to_string();
        tracing::debug!(request_id = %request_id, "{} {}", request.method, url);

        let mut builder = self
            .http
            .request(request.method.into(), &url)
            .timeout(self.config.timeout())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(REQUEST_ID_HEADER, &request_id);

        if let Some(token) = &self.config.api_token {
            builder = builder.bearer_auth(token);
        }

        if request.method.sends_body() {
            if let Some(body) = request.body {
                builder = builder.json(body);
            }
        }

        let response = builder
            .send()
            .await
            .map_err(|e| network_failure(e, request.component, &url))?;

        interpret_response(request.method, response, request.component, &url).await
    }
}
