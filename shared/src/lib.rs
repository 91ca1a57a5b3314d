pub mod body;
pub mod envelope;
pub mod http;
pub mod metrics_defs;
