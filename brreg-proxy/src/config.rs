use serde::Deserialize;
use std::fs::File;
use std::path::Path;

#[derive(Deserialize, Debug, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,
    pub sentry_dsn: Option<String>,
}

fn default_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level(),
            sentry_dsn: None,
        }
    }
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "brreg_proxy".into()
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub registry: registry::Config,
    pub settings: settings::Config,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Read the file, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.settings.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listener.port == 0 {
            return Err(ConfigError::InvalidListener);
        }
        self.registry.validate()?;
        self.settings.validate()?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("listener port must be greater than 0")]
    InvalidListener,
    #[error("invalid registry config: {0}")]
    Registry(#[from] registry::config::ValidationError),
    #[error("invalid settings config: {0}")]
    Settings(#[from] settings::config::ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use settings::config::StoreConfig;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            listener:
                host: 127.0.0.1
                port: 8080
            logging:
                level: debug
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            registry:
                base_url: http://localhost:9000/api
                search_page_size: 20
            settings:
                api_key: secret
                store:
                    type: postgrest
                    url: https://xyz.supabase.co
                    service_key: service
                    table: mappings
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.sentry_dsn, None);
        assert_eq!(config.metrics.expect("metrics").prefix, "brreg_proxy");
        assert_eq!(config.registry.base_url.as_str(), "http://localhost:9000/api");
        assert_eq!(config.registry.search_page_size, 20);
        assert_eq!(config.registry.test_page_size, 5);
        assert!(matches!(
            config.settings.store,
            StoreConfig::Postgrest { ref table, .. } if table == "mappings"
        ));
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let yaml = r#"
            settings:
                api_key: secret
                store:
                    type: memory
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.listener, Listener::default());
        assert_eq!(config.logging, LoggingConfig::default());
        assert!(config.metrics.is_none());
        assert_eq!(config.registry, registry::Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_configs() {
        let tmp = write_tmp_file("settings:\n  store:\n    type: memory\n");
        let config = Config::from_file(tmp.path()).expect("load config");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Settings(
                settings::config::ValidationError::EmptyApiKey
            ))
        ));

        let tmp = write_tmp_file(
            "listener: {host: 0.0.0.0, port: 0}\nsettings: {api_key: k, store: {type: memory}}\n",
        );
        let config = Config::from_file(tmp.path()).expect("load config");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidListener)));

        let tmp = write_tmp_file("registry:\n  base_url: not a url\n");
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::ParseError(_))
        ));

        assert!(matches!(
            Config::from_file(Path::new("/nonexistent/brreg-proxy.yaml")),
            Err(ConfigError::LoadError(_))
        ));
    }
}
