use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Registry dot-path to destination field name, in caller order.
pub type FieldMapping = IndexMap<String, String>;

/// Served for portals that have never saved a mapping.
pub const DEFAULT_MAPPINGS: [(&str, &str); 10] = [
    ("organisasjonsnummer", "organizationnumber"),
    ("navn", "name"),
    ("organisasjonsform.beskrivelse", "company_type"),
    ("naeringskode1.beskrivelse", "industry"),
    ("antallAnsatte", "numberofemployees"),
    ("forretningsadresse.adresselinje1", "address"),
    ("forretningsadresse.poststed", "city"),
    ("forretningsadresse.postnummer", "zip"),
    ("hjemmeside", "website"),
    ("telefon", "phone"),
];

pub fn default_mappings() -> FieldMapping {
    DEFAULT_MAPPINGS
        .iter()
        .map(|(path, field)| (path.to_string(), field.to_string()))
        .collect()
}

/// One stored row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MappingRecord {
    pub portal_id: String,
    /// `None` when the stored value is missing or not a usable mapping.
    #[serde(default, deserialize_with = "lenient_mapping")]
    pub mappings: Option<FieldMapping>,
    pub updated_at: Option<String>,
}

/// Rows written by older clients may hold `null` or non-string values.
/// Those read as `None` instead of failing the whole row.
pub fn lenient_mapping<'de, D>(deserializer: D) -> Result<Option<FieldMapping>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_mapping))
}

/// Parse a mapping payload from a request body.
///
/// Accepts an object, or a JSON string holding one. Returns `None` unless the
/// object is non-empty and every value is a string.
pub fn parse_mapping(value: &Value) -> Option<FieldMapping> {
    let decoded;
    let value = match value {
        Value::String(raw) => {
            decoded = serde_json::from_str::<Value>(raw).ok()?;
            &decoded
        }
        other => other,
    };

    let object = value.as_object().filter(|object| !object.is_empty())?;

    object
        .iter()
        .map(|(path, field)| field.as_str().map(|f| (path.clone(), f.to_string())))
        .collect()
}
