//! Per-portal field mapping settings, kept in a PostgREST table.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod mappings;
pub mod metrics_defs;
pub mod params;
pub mod store;

pub use api::{SettingsState, router};
pub use config::Config;
