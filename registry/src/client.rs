use crate::config::Config;
use crate::metrics_defs::{UPSTREAM_DURATION, UPSTREAM_ERRORS};
use crate::provider::SearchType;
use http::header::{ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use shared::{counter, histogram};
use std::time::{Duration, Instant};
use url::Url;

/// Entity fetched by the health probe.
pub const PROBE_ORGANIZATION_NUMBER: &str = "974760673";

const USER_AGENT_PREFIX: &str = "BusinessInfoProxy/1.0";

/// Why a registry call is made. Only used to label the outbound request.
#[derive(Clone, Copy, Debug)]
pub enum Purpose {
    Lookup,
    Test,
    HealthCheck,
}

impl Purpose {
    fn user_agent(&self) -> String {
        let suffix = match self {
            Purpose::Lookup => "HubSpot-Integration",
            Purpose::Test => "BrregTest",
            Purpose::HealthCheck => "HealthCheck",
        };
        format!("{USER_AGENT_PREFIX} {suffix}")
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("Brreg API error: {code} {status_text}", code = .status.as_u16())]
    UpstreamStatus {
        status: StatusCode,
        status_text: String,
    },
    #[error("registry request timed out after {0}s")]
    Timeout(u64),
    #[error("registry request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("registry base URL cannot hold a path: {0}")]
    InvalidBaseUrl(String),
}

/// Thin client for the registry's `/enheter` resource. One attempt per call,
/// no retries.
#[derive(Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: Url,
    search_page_size: u32,
    test_page_size: u32,
    health_timeout: Duration,
}

impl RegistryClient {
    pub fn new(config: &Config) -> Self {
        RegistryClient {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            search_page_size: config.search_page_size,
            test_page_size: config.test_page_size,
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        }
    }

    pub fn search_page_size(&self) -> u32 {
        self.search_page_size
    }

    pub fn test_page_size(&self) -> u32 {
        self.test_page_size
    }

    /// `{base}/enheter` plus any extra path segments, each percent-encoded.
    fn enheter_url(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RegistryError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("enheter")
            .extend(segments);
        Ok(url)
    }

    pub fn entity_url(&self, organization_number: &str) -> Result<Url, RegistryError> {
        self.enheter_url(&[organization_number])
    }

    pub fn search_url(&self, name: &str, size: u32) -> Result<Url, RegistryError> {
        let mut url = self.enheter_url(&[])?;
        url.query_pairs_mut()
            .append_pair("navn", name)
            .append_pair("size", &size.to_string());
        Ok(url)
    }

    /// Run a lookup and hand back the decoded upstream payload untouched.
    pub async fn lookup(
        &self,
        search_type: SearchType,
        search_value: &str,
        page_size: u32,
        purpose: Purpose,
    ) -> Result<Value, RegistryError> {
        let url = match search_type {
            SearchType::Organisasjonsnummer => self.entity_url(search_value)?,
            SearchType::Navn => self.search_url(search_value, page_size)?,
        };

        self.fetch_json(url, purpose).await
    }

    async fn fetch_json(&self, url: Url, purpose: Purpose) -> Result<Value, RegistryError> {
        tracing::info!(url = %url, ?purpose, "fetching from registry");

        let started = Instant::now();
        let result = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, purpose.user_agent())
            .send()
            .await;
        histogram!(UPSTREAM_DURATION).record(started.elapsed().as_secs_f64());

        let response = result.inspect_err(|_| counter!(UPSTREAM_ERRORS).increment(1))?;

        let status = response.status();
        if !status.is_success() {
            counter!(UPSTREAM_ERRORS).increment(1);
            let status_text = status.canonical_reason().unwrap_or_default().to_string();
            tracing::warn!(status = status.as_u16(), %status_text, "registry returned an error");
            return Err(RegistryError::UpstreamStatus {
                status,
                status_text,
            });
        }

        Ok(response.json::<Value>().await?)
    }

    /// Fetch a known entity with a client-side timeout. Any HTTP response,
    /// successful or not, means the registry is reachable.
    pub async fn probe(&self) -> Result<StatusCode, RegistryError> {
        let url = self.entity_url(PROBE_ORGANIZATION_NUMBER)?;

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, Purpose::HealthCheck.user_agent())
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RegistryError::Timeout(self.health_timeout.as_secs())
                } else {
                    RegistryError::Request(e)
                }
            })?;

        Ok(response.status())
    }
}
