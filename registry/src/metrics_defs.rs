//! Metrics definitions for the registry lookups.

use shared::metrics_defs::{MetricDef, MetricType};

pub const LOOKUP_REQUESTS: MetricDef = MetricDef {
    name: "lookup.requests",
    metric_type: MetricType::Counter,
    description: "Number of lookup requests. Tagged with endpoint and outcome.",
};

pub const UPSTREAM_ERRORS: MetricDef = MetricDef {
    name: "lookup.upstream_errors",
    metric_type: MetricType::Counter,
    description: "Registry calls that failed or returned a non-2xx status",
};

pub const UPSTREAM_DURATION: MetricDef = MetricDef {
    name: "lookup.upstream.duration",
    metric_type: MetricType::Histogram,
    description: "Registry call duration in seconds",
};

pub const HEALTH_PROBE_FAILURES: MetricDef = MetricDef {
    name: "health.probe.failures",
    metric_type: MetricType::Counter,
    description: "Health probes that could not reach the registry",
};

pub const ALL_METRICS: &[MetricDef] = &[
    LOOKUP_REQUESTS,
    UPSTREAM_ERRORS,
    UPSTREAM_DURATION,
    HEALTH_PROBE_FAILURES,
];
