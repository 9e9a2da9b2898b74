//! Server configuration.
//!
//! [`ServerConfig`] is read once at startup from a TOML file layered with
//! `TRELLIS_`-prefixed environment variables (`__` separates nested keys, so
//! `TRELLIS_SETTINGS__DATABASE_URL` sets `settings.database_url`).
//! [`ConfigService`] is the read-only view components resolve from the
//! registry under the name `config`.

use crate::error::{Result, TrellisError};
use config::{Config, Environment, File, FileFormat};
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

pub const ENV_PREFIX: &str = "TRELLIS";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    /// Free-form application settings, exposed through [`ConfigService`].
    pub settings: BTreeMap<String, Value>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            name: "trellis".to_string(),
            settings: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file. The file must exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(TrellisError::configuration(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }

        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| TrellisError::configuration(format!("{}: {e}", path.display())))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| TrellisError::configuration(format!("{}: {e}", path.display())))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(loaded)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read-only key/value view over configuration settings, falling back to the
/// process environment.
///
/// Nested settings are flattened with `.`: `[settings.database] url = ".."`
/// is read as `database.url`.
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        let service = Self::new();
        service.insert("host", config.host.clone());
        service.insert("port", config.port.to_string());
        service.insert("name", config.name.clone());
        for (key, value) in &config.settings {
            service.flatten(key, value);
        }
        service
    }

    fn flatten(&self, key: &str, value: &Value) {
        match value {
            Value::Object(map) => {
                for (child, value) in map {
                    self.flatten(&format!("{key}.{child}"), value);
                }
            }
            Value::String(s) => self.insert(key, s.clone()),
            other => self.insert(key, other.to_string()),
        }
    }

    fn insert(&self, key: &str, value: String) {
        self.config.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config
            .get(key)
            .map(|v| v.clone())
            .or_else(|| env::var(key).ok())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Read and parse a value; a present but unparseable value is an error.
    pub fn get_as<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse().map_err(|e| {
                    TrellisError::configuration(format!("invalid value for '{key}': {e}"))
                })
            })
            .transpose()
    }

    /// Number of keys loaded from configuration (environment not included).
    pub fn len(&self) -> usize {
        self.config.len()
    }

    pub fn is_empty(&self) -> bool {
        self.config.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = ServerConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, TrellisError::Configuration { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_malformed_file_is_configuration_error() {
        let file = toml_file("port = \"not a number\"\n[[[");
        let err = ServerConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, TrellisError::Configuration { .. }));
    }

    #[test]
    fn test_load_with_defaults_and_settings() {
        let file = toml_file(
            r#"
port = 8081

[settings]
greeting = "hello"
retries = 3

[settings.database]
url = "postgres://localhost/app"
"#,
        );
        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.address(), "0.0.0.0:8081");

        let service = ConfigService::from_config(&config);
        assert_eq!(service.get("greeting").as_deref(), Some("hello"));
        assert_eq!(service.get_as::<u32>("retries").unwrap(), Some(3));
        assert_eq!(
            service.get("database.url").as_deref(),
            Some("postgres://localhost/app")
        );
        assert_eq!(service.get("port").as_deref(), Some("8081"));
        assert!(service.get_as::<u32>("greeting").is_err());
        assert_eq!(service.get_or("missing.key", "fallback"), "fallback");
    }

    #[test]
    fn test_environment_overrides_settings() {
        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("TRELLIS_SETTINGS__ENV_ONLY_FLAG", "on") };
        let file = toml_file("name = \"orders\"\n");
        let config = ServerConfig::load(file.path()).unwrap();
        unsafe { env::remove_var("TRELLIS_SETTINGS__ENV_ONLY_FLAG") };

        assert_eq!(config.name, "orders");
        let service = ConfigService::from_config(&config);
        assert_eq!(service.get("env_only_flag").as_deref(), Some("on"));
    }
}
