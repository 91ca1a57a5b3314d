use crate::errors::LookupError;
use crate::params::non_empty;
use serde::Serialize;
use std::collections::HashMap;

/// Registries a lookup can be routed to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    /// Brønnøysundregistrene, the Norwegian entity register
    Brreg,
}

impl Provider {
    pub const SUPPORTED: [&'static str; 2] = ["brreg", "norwegian"];

    /// Case-insensitive; no value selects Brreg.
    pub fn parse(raw: Option<&str>) -> Result<Self, LookupError> {
        let Some(raw) = raw else {
            return Ok(Provider::Brreg);
        };

        match raw.to_lowercase().as_str() {
            "brreg" | "norwegian" => Ok(Provider::Brreg),
            _ => Err(LookupError::UnsupportedProvider(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Brreg => "brreg",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Organisasjonsnummer,
    Navn,
}

impl SearchType {
    pub const VALID: [&'static str; 2] = ["organisasjonsnummer", "navn"];

    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        match raw {
            "organisasjonsnummer" => Ok(SearchType::Organisasjonsnummer),
            "navn" => Ok(SearchType::Navn),
            _ => Err(LookupError::InvalidSearchType(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Organisasjonsnummer => "organisasjonsnummer",
            SearchType::Navn => "navn",
        }
    }
}

/// A validated lookup. Constructing one never touches the network.
#[derive(Clone, Debug, PartialEq)]
pub struct LookupRequest {
    pub provider: Provider,
    pub search_type: SearchType,
    pub search_value: String,
}

impl LookupRequest {
    /// Build a lookup from cleaned request parameters.
    ///
    /// Explicit `searchType`/`searchValue` win. Otherwise a bare
    /// `organisasjonsnummer` or `navn` parameter is used, in that order.
    /// Checks run in a fixed order: required fields, provider, search type.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, LookupError> {
        // Only an absent key defaults; an empty value is an unknown provider.
        let provider_raw = params.get("provider").map(String::as_str);

        let (search_type, search_value) = match (
            non_empty(params, "searchType"),
            non_empty(params, "searchValue"),
        ) {
            (None, None) => SearchType::VALID
                .iter()
                .find_map(|key| non_empty(params, key).map(|value| (Some(*key), Some(value))))
                .unwrap_or((None, None)),
            explicit => explicit,
        };

        let (Some(search_type), Some(search_value)) = (search_type, search_value) else {
            return Err(LookupError::MissingParameters {
                search_type: search_type.map(String::from),
                search_value: search_value.map(String::from),
                provider: provider_raw.map(String::from),
            });
        };

        let provider = Provider::parse(provider_raw)?;
        let search_type = SearchType::parse(search_type)?;

        Ok(LookupRequest {
            provider,
            search_type,
            search_value: search_value.to_string(),
        })
    }
}
