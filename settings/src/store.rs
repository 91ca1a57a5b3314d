use crate::config::StoreConfig;
use crate::mappings::{FieldMapping, MappingRecord, lenient_mapping};
use async_trait::async_trait;
use http::header::{ACCEPT, CONTENT_TYPE};
use parking_lot::RwLock;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// PostgREST error code for "no row" on a single-object read
const NO_ROWS_CODE: &str = "PGRST116";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const UPSERT_PREFERENCE: &str = "resolution=merge-duplicates,return=representation";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("store returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("store returned no row for the upsert")]
    EmptyUpsert,

    #[error("store url cannot hold a path: {0}")]
    InvalidUrl(String),
}

/// Per-portal mapping persistence.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// `None` when the portal has never saved a mapping.
    async fn get(&self, portal_id: &str) -> Result<Option<MappingRecord>, StoreError>;

    /// Insert or fully replace the portal's row and return what was stored.
    async fn upsert(&self, record: MappingRecord) -> Result<MappingRecord, StoreError>;
}

pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn MappingStore>, StoreError> {
    match config {
        StoreConfig::Postgrest {
            url,
            service_key,
            table,
        } => Ok(Arc::new(PostgrestStore::new(url, service_key, table)?)),
        StoreConfig::Memory => {
            tracing::warn!("using the in-memory mapping store, saved mappings will not survive a restart");
            Ok(Arc::new(MemoryStore::default()))
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<String, MappingRecord>>,
}

#[async_trait]
impl MappingStore for MemoryStore {
    async fn get(&self, portal_id: &str) -> Result<Option<MappingRecord>, StoreError> {
        Ok(self.rows.read().get(portal_id).cloned())
    }

    async fn upsert(&self, record: MappingRecord) -> Result<MappingRecord, StoreError> {
        self.rows
            .write()
            .insert(record.portal_id.clone(), record.clone());
        Ok(record)
    }
}

/// Table behind a PostgREST API, addressed as `{url}/rest/v1/{table}`.
pub struct PostgrestStore {
    client: reqwest::Client,
    table_url: Url,
    service_key: String,
}

#[derive(Deserialize)]
struct StoredMappings {
    #[serde(default, deserialize_with = "lenient_mapping")]
    mappings: Option<FieldMapping>,
    updated_at: Option<String>,
}

#[derive(Deserialize, Default)]
struct PostgrestErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl PostgrestStore {
    pub fn new(url: &Url, service_key: &str, table: &str) -> Result<Self, StoreError> {
        let mut table_url = url.clone();
        table_url
            .path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(url.to_string()))?
            .pop_if_empty()
            .extend(["rest", "v1", table]);

        Ok(PostgrestStore {
            client: reqwest::Client::new(),
            table_url,
            service_key: service_key.to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn error_body(response: reqwest::Response) -> PostgrestErrorBody {
        response.json().await.unwrap_or_default()
    }
}

#[async_trait]
impl MappingStore for PostgrestStore {
    async fn get(&self, portal_id: &str) -> Result<Option<MappingRecord>, StoreError> {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("portal_id", &format!("eq.{portal_id}"))
            .append_pair("select", "mappings,updated_at");

        let response = self
            .request(reqwest::Method::GET, url)
            .header(ACCEPT, SINGLE_OBJECT)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let row: StoredMappings = response.json().await?;
            return Ok(Some(MappingRecord {
                portal_id: portal_id.to_string(),
                mappings: row.mappings,
                updated_at: row.updated_at,
            }));
        }

        let body = Self::error_body(response).await;
        if status == StatusCode::NOT_ACCEPTABLE && body.code == NO_ROWS_CODE {
            tracing::debug!(%portal_id, "no stored mapping");
            return Ok(None);
        }

        Err(StoreError::Status {
            status,
            message: body.message,
        })
    }

    async fn upsert(&self, record: MappingRecord) -> Result<MappingRecord, StoreError> {
        let mut url = self.table_url.clone();
        url.query_pairs_mut().append_pair("on_conflict", "portal_id");

        let response = self
            .request(reqwest::Method::POST, url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header("Prefer", UPSERT_PREFERENCE)
            .json(&record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = Self::error_body(response).await;
            return Err(StoreError::Status {
                status,
                message: body.message,
            });
        }

        let rows: Vec<MappingRecord> = response.json().await?;
        rows.into_iter().next().ok_or(StoreError::EmptyUpsert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappings::default_mappings;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> PostgrestStore {
        PostgrestStore::new(&Url::parse(&server.uri()).unwrap(), "service-key", "field_mappings")
            .unwrap()
    }

    fn record(portal: &str, city_field: &str) -> MappingRecord {
        let mut mappings = FieldMapping::new();
        mappings.insert("forretningsadresse.poststed".into(), city_field.into());
        MappingRecord {
            portal_id: portal.into(),
            mappings: Some(mappings),
            updated_at: Some("2025-01-01T00:00:00.000Z".into()),
        }
    }

    #[tokio::test]
    async fn test_memory_store_replaces_rows() {
        let store = MemoryStore::default();
        assert_eq!(store.get("1").await.unwrap(), None);

        store.upsert(record("1", "city")).await.unwrap();
        store.upsert(record("1", "town")).await.unwrap();

        let stored = store.get("1").await.unwrap().unwrap();
        let mappings = stored.mappings.unwrap();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings["forretningsadresse.poststed"], "town");
        assert_eq!(store.get("2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_postgrest_get() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/field_mappings"))
            .and(query_param("portal_id", "eq.123"))
            .and(query_param("select", "mappings,updated_at"))
            .and(header("accept", SINGLE_OBJECT))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "mappings": {"navn": "name"},
                "updated_at": "2025-03-01T10:00:00+00:00"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stored = store_for(&server).get("123").await.unwrap().unwrap();
        assert_eq!(stored.portal_id, "123");
        assert_eq!(stored.mappings.unwrap()["navn"], "name");
        assert_eq!(stored.updated_at.as_deref(), Some("2025-03-01T10:00:00+00:00"));
    }

    #[tokio::test]
    async fn test_postgrest_no_rows_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/field_mappings"))
            .respond_with(ResponseTemplate::new(406).set_body_json(json!({
                "code": "PGRST116",
                "details": "The result contains 0 rows",
                "message": "JSON object requested, multiple (or no) rows returned"
            })))
            .mount(&server)
            .await;

        assert_eq!(store_for(&server).get("404").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_postgrest_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "PGRST301",
                "message": "JWT expired"
            })))
            .mount(&server)
            .await;

        let err = store_for(&server).get("1").await.unwrap_err();
        assert_eq!(err.to_string(), "store returned 401 Unauthorized: JWT expired");
    }

    #[tokio::test]
    async fn test_postgrest_upsert() {
        let server = MockServer::start().await;
        let row = record("77", "city");

        Mock::given(method("POST"))
            .and(path("/rest/v1/field_mappings"))
            .and(query_param("on_conflict", "portal_id"))
            .and(header("prefer", UPSERT_PREFERENCE))
            .and(body_json(&row))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
                "id": 9,
                "portal_id": "77",
                "mappings": {"forretningsadresse.poststed": "city"},
                "updated_at": "2025-01-01T00:00:00.000Z"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let stored = store_for(&server).upsert(row.clone()).await.unwrap();
        assert_eq!(stored, row);
    }

    #[tokio::test]
    async fn test_postgrest_upsert_without_rows() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .mount(&server)
            .await;

        let row = MappingRecord {
            portal_id: "1".into(),
            mappings: Some(default_mappings()),
            updated_at: None,
        };
        assert!(matches!(
            store_for(&server).upsert(row).await,
            Err(StoreError::EmptyUpsert)
        ));
    }
}
