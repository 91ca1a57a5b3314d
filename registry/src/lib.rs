//! Proxy endpoints in front of the Norwegian business registry (Brreg).

pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod metrics_defs;
pub mod params;
pub mod provider;
pub mod summary;

pub use api::router;
pub use client::RegistryClient;
pub use config::Config;
