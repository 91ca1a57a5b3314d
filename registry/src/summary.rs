use serde::Serialize;
use serde_json::Value;

const UNKNOWN: &str = "Unknown";

/// Condensed view of one registry entity.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub name: String,
    pub org_number: String,
    /// Human readable organisation form, e.g. "Aksjeselskap"
    pub status: String,
    pub municipality: String,
}

impl CompanySummary {
    pub fn from_entity(entity: &Value) -> Self {
        let field = |pointer: &str| {
            entity
                .pointer(pointer)
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN)
                .to_string()
        };

        CompanySummary {
            name: field("/navn"),
            org_number: field("/organisasjonsnummer"),
            status: field("/organisasjonsform/beskrivelse"),
            municipality: field("/forretningsadresse/kommune"),
        }
    }
}

/// Entities embedded in a name-search payload, in upstream order.
pub fn embedded_entities(payload: &Value) -> &[Value] {
    payload
        .pointer("/_embedded/enheter")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

pub fn summarize(payload: &Value) -> Vec<CompanySummary> {
    embedded_entities(payload)
        .iter()
        .map(CompanySummary::from_entity)
        .collect()
}
