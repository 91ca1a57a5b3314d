use crate::auth::authenticate;
use crate::errors::SettingsError;
use crate::mappings::{FieldMapping, MappingRecord, default_mappings, parse_mapping};
use crate::metrics_defs::{AUTH_FAILURES, SETTINGS_REQUESTS, STORE_ERRORS};
use crate::params::SettingsParams;
use crate::store::MappingStore;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use shared::body::decode_body;
use shared::counter;
use shared::envelope::{
    ErrorBody, ErrorKind, cors_layer, method_not_allowed, read_write_methods, timestamp,
};
use std::collections::HashMap;
use std::sync::Arc;

const SAVED_MESSAGE: &str = "Field mappings saved successfully";

#[derive(Clone)]
pub struct SettingsState {
    store: Arc<dyn MappingStore>,
    api_key: Arc<str>,
}

impl SettingsState {
    pub fn new(store: Arc<dyn MappingStore>, api_key: &str) -> Self {
        SettingsState {
            store,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn router(state: SettingsState) -> Router {
    Router::new()
        .route(
            "/api/settings",
            get(get_settings)
                .post(save_settings)
                .fallback(method_not_allowed)
                .layer(cors_layer(&read_write_methods())),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct MappingResponse {
    success: bool,
    data: FieldMapping,
    updated_at: Option<String>,
    portal_id: String,
}

#[derive(Serialize)]
struct SavedResponse {
    success: bool,
    data: MappingRecord,
    message: &'static str,
    portal_id: String,
}

/// Resolve aliases and check the key. Runs before any store access.
fn authorized_params(
    state: &SettingsState,
    method: &'static str,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
    body: &Bytes,
) -> Result<SettingsParams, SettingsError> {
    counter!(SETTINGS_REQUESTS, "method" => method).increment(1);

    let params = SettingsParams::resolve(headers, query, &decode_body(body));

    authenticate(&state.api_key, params.api_key.as_deref()).inspect_err(|_| {
        counter!(AUTH_FAILURES).increment(1);
        tracing::warn!(portal_id = %params.portal_id, method, "rejected settings request");
    })?;

    Ok(params)
}

async fn get_settings(
    State(state): State<SettingsState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<MappingResponse>, SettingsError> {
    let params = authorized_params(&state, "GET", &headers, &query, &body)?;
    if !params.is_field_mappings() {
        return Err(SettingsError::InvalidQuery);
    }

    let stored = state.store.get(&params.portal_id).await?;
    tracing::info!(portal_id = %params.portal_id, found = stored.is_some(), "loaded field mappings");

    let (data, updated_at) = match stored {
        Some(record) => (
            record.mappings.unwrap_or_else(default_mappings),
            record.updated_at,
        ),
        None => (default_mappings(), None),
    };

    Ok(Json(MappingResponse {
        success: true,
        data,
        updated_at,
        portal_id: params.portal_id,
    }))
}

async fn save_settings(
    State(state): State<SettingsState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<SavedResponse>, SettingsError> {
    let params = authorized_params(&state, "POST", &headers, &query, &body)?;
    if !params.is_field_mappings() {
        return Err(SettingsError::InvalidPayload);
    }
    let mappings = params
        .mapping
        .as_ref()
        .and_then(parse_mapping)
        .ok_or(SettingsError::InvalidPayload)?;

    let stored = state
        .store
        .upsert(MappingRecord {
            portal_id: params.portal_id.clone(),
            mappings: Some(mappings),
            updated_at: Some(timestamp()),
        })
        .await?;
    tracing::info!(portal_id = %params.portal_id, fields = stored.mappings.as_ref().map_or(0, |m| m.len()), "saved field mappings");

    Ok(Json(SavedResponse {
        success: true,
        data: stored,
        message: SAVED_MESSAGE,
        portal_id: params.portal_id,
    }))
}

impl IntoResponse for SettingsError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        match self {
            SettingsError::InvalidApiKey => {
                ErrorBody::new(ErrorKind::InvalidApiKey, "Invalid or missing API key", message)
                    .into_response_with(StatusCode::FORBIDDEN)
            }
            SettingsError::InvalidQuery => ErrorBody::new(
                ErrorKind::ValidationError,
                "Missing portalId or invalid type",
                message,
            )
            .into_response_with(StatusCode::BAD_REQUEST),
            SettingsError::InvalidPayload => {
                ErrorBody::new(ErrorKind::ValidationError, "Missing required fields", message)
                    .into_response_with(StatusCode::BAD_REQUEST)
            }
            SettingsError::Store(err) => {
                counter!(STORE_ERRORS).increment(1);
                tracing::error!(error = %err, "mapping store failed");
                ErrorBody::new(ErrorKind::StoreError, "Store error", message)
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
