use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://data.brreg.no/enhetsregisteret/api";

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("registry base_url must be http(s), got {0}")]
    UnsupportedScheme(String),

    #[error("{0} must be greater than 0")]
    ZeroValue(&'static str),
}

/// Registry upstream configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Base URL of the registry REST API, without the `/enheter` suffix
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Page size for name searches made by the business-info endpoint
    #[serde(default = "default_search_page_size")]
    pub search_page_size: u32,
    /// Page size for name searches made by the test endpoint
    #[serde(default = "default_test_page_size")]
    pub test_page_size: u32,
    /// Client-side timeout for the health probe. Lookups have none.
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default registry URL is valid")
}

fn default_search_page_size() -> u32 {
    10
}

fn default_test_page_size() -> u32 {
    5
}

fn default_health_timeout_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: default_base_url(),
            search_page_size: default_search_page_size(),
            test_page_size: default_test_page_size(),
            health_timeout_secs: default_health_timeout_secs(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(ValidationError::UnsupportedScheme(
                self.base_url.scheme().to_string(),
            ));
        }
        if self.search_page_size == 0 {
            return Err(ValidationError::ZeroValue("search_page_size"));
        }
        if self.test_page_size == 0 {
            return Err(ValidationError::ZeroValue("test_page_size"));
        }
        if self.health_timeout_secs == 0 {
            return Err(ValidationError::ZeroValue("health_timeout_secs"));
        }
        Ok(())
    }
}
