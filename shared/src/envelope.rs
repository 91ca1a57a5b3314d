//! Response conventions shared by every handler: permissive CORS, JSON error
//! bodies and the catch-all that turns handler panics into `InternalError`.

use axum::Json;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use http::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue,
};
use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};

pub const CRM_SIGNATURE_HEADER: HeaderName = HeaderName::from_static("x-hubspot-signature-v3");
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Methods accepted by the lookup and settings routes.
pub fn read_write_methods() -> [Method; 3] {
    [Method::GET, Method::POST, Method::OPTIONS]
}

/// Methods accepted by read-only routes such as the health check.
pub fn read_only_methods() -> [Method; 2] {
    [Method::GET, Method::OPTIONS]
}

/// Current time formatted the way every response body reports it.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Machine readable failure category carried in every error body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ValidationError,
    UnsupportedProvider,
    UpstreamError,
    InvalidApiKey,
    MethodNotAllowed,
    StoreError,
    InternalError,
}

/// JSON error payload. Extra fields are flattened next to the fixed ones.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    success: bool,
    error: String,
    kind: ErrorKind,
    message: String,
    timestamp: String,
    #[serde(flatten)]
    details: Map<String, Value>,
}

impl ErrorBody {
    pub fn new(kind: ErrorKind, error: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorBody {
            success: false,
            error: error.into(),
            kind,
            message: message.into(),
            timestamp: timestamp(),
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// CORS policy applied to every route: any origin, the given methods and the
/// headers the CRM integration sends.
pub fn cors_layer(methods: &[Method]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(methods.to_vec())
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            CRM_SIGNATURE_HEADER,
            API_KEY_HEADER,
        ])
}

/// Method-router fallback for verbs a route does not serve.
pub async fn method_not_allowed(method: Method) -> Response {
    ErrorBody::new(
        ErrorKind::MethodNotAllowed,
        "Method not allowed",
        format!("{method} is not supported on this endpoint"),
    )
    .into_response_with(StatusCode::METHOD_NOT_ALLOWED)
}

pub fn catch_panic_layer() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(panic_response as fn(Box<dyn Any + Send + 'static>) -> Response)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown failure".to_string()
    };

    tracing::error!(%message, "handler panicked");

    // Panics bypass the per-route CORS layer.
    let mut response = ErrorBody::new(ErrorKind::InternalError, "Internal server error", message)
        .into_response_with(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}
