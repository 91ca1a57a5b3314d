// Settings callers use either compact (`p`, `t`, `k`, `d`) or verbose
// (`portalId`, `type`, `apiKey`, `data`/`mappings`) parameter names. The
// compact alias wins, and the query wins over the body.
use http::HeaderMap;
use serde_json::{Map, Value};
use shared::body::scalar_to_string;
use shared::envelope::API_KEY_HEADER;
use std::collections::HashMap;

pub const DEFAULT_PORTAL: &str = "default";

/// Accepted values of the `type` parameter.
pub const FIELD_MAPPINGS_TYPES: [&str; 2] = ["field_mappings", "fm"];

/// Canonical settings parameters after alias resolution
#[derive(Clone, Debug, PartialEq)]
pub struct SettingsParams {
    pub portal_id: String,
    pub kind: Option<String>,
    pub api_key: Option<String>,
    /// Raw mapping payload. Shape is checked by the handler.
    pub mapping: Option<Value>,
}

impl SettingsParams {
    pub fn resolve(
        headers: &HeaderMap,
        query: &HashMap<String, String>,
        body: &Map<String, Value>,
    ) -> Self {
        let from_query = |key: &str| query.get(key).cloned();
        let from_body = |key: &str| body.get(key).and_then(scalar_to_string);
        let from_header = headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let portal_id = first_present([
            from_query("p"),
            from_query("portalId"),
            from_body("p"),
            from_body("portalId"),
        ])
        .unwrap_or_else(|| DEFAULT_PORTAL.to_string());

        let kind = first_present([
            from_query("t"),
            from_query("type"),
            from_body("t"),
            from_body("type"),
        ]);

        let api_key = first_present([
            from_header,
            from_query("k"),
            from_query("apiKey"),
            from_body("apiKey"),
            from_body("k"),
        ]);

        let mapping = ["d", "data", "mappings"]
            .iter()
            .find_map(|key| body.get(*key).filter(|value| !value.is_null()))
            .cloned();

        SettingsParams {
            portal_id,
            kind,
            api_key,
            mapping,
        }
    }

    pub fn is_field_mappings(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|kind| FIELD_MAPPINGS_TYPES.contains(&kind))
    }
}

fn first_present<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
}
