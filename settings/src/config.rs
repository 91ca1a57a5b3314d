use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_TABLE: &str = "field_mappings";

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("settings api_key must be set")]
    EmptyApiKey,

    #[error("store {0} must not be empty")]
    EmptyStoreField(&'static str),

    #[error("invalid store url {0}")]
    InvalidUrl(String),
}

/// Settings endpoint configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Shared secret callers must present. There is no default.
    #[serde(default)]
    pub api_key: String,
    pub store: StoreConfig,
}

/// Backend holding the per-portal mapping rows
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// A PostgREST endpoint such as Supabase
    Postgrest {
        url: Url,
        service_key: String,
        #[serde(default = "default_table")]
        table: String,
    },
    /// Process-local map. Contents are lost on restart.
    Memory,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

impl Config {
    /// Apply `BRREG_API_KEY`, `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY`.
    /// The store variables only touch a `postgrest` store.
    pub fn apply_env<F>(&mut self, var: F) -> Result<(), ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = var("BRREG_API_KEY") {
            self.api_key = api_key;
        }

        if let StoreConfig::Postgrest {
            url, service_key, ..
        } = &mut self.store
        {
            if let Some(raw) = var("SUPABASE_URL") {
                *url = Url::parse(&raw).map_err(|_| ValidationError::InvalidUrl(raw))?;
            }
            if let Some(key) = var("SUPABASE_SERVICE_ROLE_KEY") {
                *service_key = key;
            }
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::EmptyApiKey);
        }

        match &self.store {
            StoreConfig::Postgrest {
                url,
                service_key,
                table,
            } => {
                if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
                    return Err(ValidationError::InvalidUrl(url.to_string()));
                }
                if service_key.is_empty() {
                    return Err(ValidationError::EmptyStoreField("service_key"));
                }
                if table.is_empty() {
                    return Err(ValidationError::EmptyStoreField("table"));
                }
            }
            StoreConfig::Memory => {}
        }

        Ok(())
    }
}
