use crate::client::{Purpose, RegistryClient, RegistryError};
use crate::errors::LookupError;
use crate::metrics_defs::{HEALTH_PROBE_FAILURES, LOOKUP_REQUESTS};
use crate::params::{clean_crm_params, non_empty};
use crate::provider::{LookupRequest, Provider, SearchType};
use crate::summary::{CompanySummary, embedded_entities, summarize};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use rand::Rng;
use serde::Serialize;
use serde_json::{Value, json};
use shared::body::{decode_body, string_params};
use shared::counter;
use shared::envelope::{
    ErrorBody, ErrorKind, cors_layer, method_not_allowed, read_only_methods, read_write_methods,
    timestamp,
};
use std::collections::HashMap;

pub const SERVICE_NAME: &str = "business-info-proxy";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_TEST_QUERY: &str = "PROPER AS";
const DEFAULT_TEST_ACTION: &str = "search";
const NOT_SENT: &str = "ikke sendt";

/// Routes served by the registry side of the proxy.
pub fn router(client: RegistryClient) -> Router {
    Router::new()
        .route(
            "/api/business-info",
            get(business_info_get)
                .post(business_info_post)
                .fallback(method_not_allowed)
                .layer(cors_layer(&read_write_methods())),
        )
        .route(
            "/api/brreg-test",
            get(brreg_test)
                .post(brreg_test)
                .fallback(method_not_allowed)
                .layer(cors_layer(&read_write_methods())),
        )
        .route(
            "/api/dummy",
            get(dummy)
                .post(dummy)
                .fallback(method_not_allowed)
                .layer(cors_layer(&read_write_methods())),
        )
        .route(
            "/api/health",
            get(health)
                .fallback(method_not_allowed)
                .layer(cors_layer(&read_only_methods())),
        )
        .with_state(client)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    provider: &'static str,
    search_type: SearchType,
    search_value: String,
    timestamp: String,
    data: Value,
    success: bool,
}

impl IntoResponse for LookupResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

async fn business_info_get(
    State(client): State<RegistryClient>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<LookupResponse, LookupError> {
    let (params, crm) = clean_crm_params(query);
    tracing::debug!(crm_request = crm.is_crm_request(), "business-info GET");
    lookup(&client, &params).await
}

async fn business_info_post(
    State(client): State<RegistryClient>,
    body: Bytes,
) -> Result<LookupResponse, LookupError> {
    let params = string_params(&decode_body(&body));
    lookup(&client, &params).await
}

async fn lookup(
    client: &RegistryClient,
    params: &HashMap<String, String>,
) -> Result<LookupResponse, LookupError> {
    let result = run_lookup(client, params).await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(LookupError::Registry(_)) => "upstream_error",
        Err(_) => "rejected",
    };
    counter!(LOOKUP_REQUESTS, "endpoint" => "business-info", "outcome" => outcome).increment(1);

    result
}

async fn run_lookup(
    client: &RegistryClient,
    params: &HashMap<String, String>,
) -> Result<LookupResponse, LookupError> {
    let request = LookupRequest::from_params(params)?;

    let data = match request.provider {
        Provider::Brreg => {
            client
                .lookup(
                    request.search_type,
                    &request.search_value,
                    client.search_page_size(),
                    Purpose::Lookup,
                )
                .await?
        }
    };

    Ok(LookupResponse {
        provider: request.provider.as_str(),
        search_type: request.search_type,
        search_value: request.search_value,
        timestamp: timestamp(),
        data,
        success: true,
    })
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        match self {
            LookupError::MissingParameters {
                search_type,
                search_value,
                provider,
            } => ErrorBody::new(
                ErrorKind::ValidationError,
                "Missing required parameters",
                message,
            )
            .with_detail(
                "receivedParams",
                json!({
                    "searchType": search_type,
                    "searchValue": search_value,
                    "provider": provider,
                }),
            )
            .into_response_with(StatusCode::BAD_REQUEST),

            LookupError::InvalidSearchType(received) => ErrorBody::new(
                ErrorKind::ValidationError,
                "Invalid search type for Brreg",
                format!("searchType must be one of: {}", SearchType::VALID.join(", ")),
            )
            .with_detail("received", received)
            .into_response_with(StatusCode::BAD_REQUEST),

            LookupError::UnsupportedProvider(received) => ErrorBody::new(
                ErrorKind::UnsupportedProvider,
                "Unsupported provider",
                format!("Provider '{received}' is not supported"),
            )
            .with_detail("received", received)
            .with_detail("supportedProviders", Provider::SUPPORTED.to_vec())
            .into_response_with(StatusCode::BAD_REQUEST),

            LookupError::Registry(RegistryError::UpstreamStatus {
                status,
                status_text,
            }) => ErrorBody::new(
                ErrorKind::UpstreamError,
                "Brreg API error",
                format!("Failed to fetch data from Brreg: {status_text}"),
            )
            .with_detail("statusCode", status.as_u16())
            .with_detail("statusText", status_text)
            .into_response_with(status),

            LookupError::Registry(err) => {
                tracing::error!(error = %err, "registry request failed");
                ErrorBody::new(
                    ErrorKind::InternalError,
                    "Brreg service error",
                    "Failed to connect to Norwegian Business Registry",
                )
                .with_detail("details", err.to_string())
                .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

#[derive(Serialize)]
struct TestSearch {
    query: String,
    action: String,
    results_count: usize,
}

#[derive(Serialize)]
struct TestResponse {
    success: bool,
    message: String,
    timestamp: String,
    crm_request: bool,
    search: TestSearch,
    data: Vec<CompanySummary>,
    raw_count: usize,
    registry_response_ok: bool,
}

/// Name search with a fixed small page, reduced to a summary list. Runs with
/// defaults when the caller sends nothing.
async fn brreg_test(
    State(client): State<RegistryClient>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let (clean, crm) = clean_crm_params(query);
    let params = if method == Method::POST {
        string_params(&decode_body(&body))
    } else {
        clean
    };

    let search_query = non_empty(&params, "query")
        .unwrap_or(DEFAULT_TEST_QUERY)
        .to_string();
    let action = non_empty(&params, "action")
        .unwrap_or(DEFAULT_TEST_ACTION)
        .to_string();
    let crm_request = crm.is_crm_request();

    tracing::info!(%search_query, %action, crm_request, "registry test search");

    let result = client
        .lookup(
            SearchType::Navn,
            &search_query,
            client.test_page_size(),
            Purpose::Test,
        )
        .await;

    match result {
        Ok(payload) => {
            counter!(LOOKUP_REQUESTS, "endpoint" => "brreg-test", "outcome" => "ok").increment(1);
            let results = summarize(&payload);
            let body = TestResponse {
                success: true,
                message: format!("Brreg test completed for \"{search_query}\""),
                timestamp: timestamp(),
                crm_request,
                search: TestSearch {
                    query: search_query,
                    action,
                    results_count: results.len(),
                },
                raw_count: embedded_entities(&payload).len(),
                data: results,
                registry_response_ok: true,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            counter!(LOOKUP_REQUESTS, "endpoint" => "brreg-test", "outcome" => "upstream_error")
                .increment(1);
            tracing::error!(error = %err, "registry test search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": format!("Brreg test failed: {err}"),
                    "timestamp": timestamp(),
                    "error": err.to_string(),
                    "crm_request": crm_request,
                })),
            )
                .into_response()
        }
    }
}

/// Echo how a request arrived, split into CRM metadata and caller parameters.
async fn dummy(
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let total_params = query.len();
    let (custom, crm) = clean_crm_params(query);
    let random_number: u32 = rand::thread_rng().gen_range(0..1000);

    Json(json!({
        "success": true,
        "message": "Dummy endpoint working!",
        "timestamp": timestamp(),
        "request_analysis": {
            "method": method.as_str(),
            "is_crm_request": crm.is_crm_request(),
            "total_params": total_params,
            "crm_params": crm,
            "custom_params": custom,
            "has_signature_header": headers.contains_key("x-hubspot-signature-v3"),
            "has_timestamp_header": headers.contains_key("x-hubspot-request-timestamp"),
        },
        "demo_data": {
            "test_value": non_empty(&custom, "test").unwrap_or(NOT_SENT),
            "demo_value": non_empty(&custom, "demo").unwrap_or(NOT_SENT),
            "random_number": random_number,
        },
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProviderHealth {
    status: &'static str,
    response_time: &'static str,
    last_check: String,
}

#[derive(Serialize)]
struct EndpointInfo {
    path: &'static str,
    method: &'static str,
    description: &'static str,
}

const ENDPOINTS: &[EndpointInfo] = &[
    EndpointInfo {
        path: "/api/business-info",
        method: "GET, POST",
        description: "Main business information lookup",
    },
    EndpointInfo {
        path: "/api/brreg-test",
        method: "GET, POST",
        description: "Registry name search with summarized results",
    },
    EndpointInfo {
        path: "/api/settings",
        method: "GET, POST",
        description: "Per-portal field mapping settings",
    },
    EndpointInfo {
        path: "/api/health",
        method: "GET",
        description: "Service health check",
    },
];

/// Probe the registry. Reachable but failing is "degraded", unreachable is 503.
async fn health(State(client): State<RegistryClient>) -> Response {
    match client.probe().await {
        Ok(status) => {
            let ok = status.is_success();
            if !ok {
                tracing::warn!(status = status.as_u16(), "registry probe returned an error");
            }

            let body = json!({
                "service": SERVICE_NAME,
                "status": "healthy",
                "timestamp": timestamp(),
                "version": SERVICE_VERSION,
                "providers": {
                    "brreg": ProviderHealth {
                        status: if ok { "healthy" } else { "degraded" },
                        response_time: if ok { "normal" } else { "timeout" },
                        last_check: timestamp(),
                    },
                },
                "endpoints": ENDPOINTS,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            counter!(HEALTH_PROBE_FAILURES).increment(1);
            tracing::error!(error = %err, "health check failed");

            let body = json!({
                "service": SERVICE_NAME,
                "status": "unhealthy",
                "timestamp": timestamp(),
                "error": err.to_string(),
                "providers": {
                    "brreg": {
                        "status": "unreachable",
                        "error": "Connection timeout or network error",
                    },
                },
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}
