use crate::config::Config;
use axum::Router;
use registry::RegistryClient;
use settings::SettingsState;
use settings::store::{StoreError, build_store};
use shared::envelope::catch_panic_layer;
use tower_http::trace::TraceLayer;

/// Every route the proxy serves, with request tracing and panic handling.
pub fn build_app(config: &Config) -> Result<Router, StoreError> {
    let client = RegistryClient::new(&config.registry);
    let store = build_store(&config.settings.store)?;
    let state = SettingsState::new(store, &config.settings.api_key);

    Ok(registry::router(client)
        .merge(settings::router(state))
        .layer(catch_panic_layer())
        .layer(TraceLayer::new_for_http()))
}
