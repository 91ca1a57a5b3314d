use crate::client::RegistryError;
use thiserror::Error;

/// Errors returned by the lookup endpoints
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("searchType and searchValue are required")]
    MissingParameters {
        search_type: Option<String>,
        search_value: Option<String>,
        provider: Option<String>,
    },

    #[error("invalid search type: {0}")]
    InvalidSearchType(String),

    #[error("provider '{0}' is not supported")]
    UnsupportedProvider(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
