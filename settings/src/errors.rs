use crate::store::StoreError;
use thiserror::Error;

/// Errors returned by the settings endpoint
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("a valid API key is required")]
    InvalidApiKey,

    #[error("portal id and type field_mappings are required")]
    InvalidQuery,

    #[error("portal id, type field_mappings and a non-empty mapping of strings are required")]
    InvalidPayload,

    #[error(transparent)]
    Store(#[from] StoreError),
}
