//! Metrics definitions for the settings endpoint.

use shared::metrics_defs::{MetricDef, MetricType};

pub const SETTINGS_REQUESTS: MetricDef = MetricDef {
    name: "settings.requests",
    metric_type: MetricType::Counter,
    description: "Settings requests. Tagged with method.",
};

pub const AUTH_FAILURES: MetricDef = MetricDef {
    name: "settings.auth_failures",
    metric_type: MetricType::Counter,
    description: "Settings requests rejected for a missing or wrong API key",
};

pub const STORE_ERRORS: MetricDef = MetricDef {
    name: "settings.store_errors",
    metric_type: MetricType::Counter,
    description: "Mapping store reads or writes that failed",
};

pub const ALL_METRICS: &[MetricDef] = &[SETTINGS_REQUESTS, AUTH_FAILURES, STORE_ERRORS];
