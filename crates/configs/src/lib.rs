//! # configs
//!
//! Layered application configuration: built-in defaults, then an optional
//! TOML file, then `JANT_*` environment variables (`__` separates nesting,
//! e.g. `JANT_SERVER__BIND`). A `.env` file is loaded first when present.

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming the config file (without extension is fine).
pub const CONFIG_PATH_VAR: &str = "JANT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/jant";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".into(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://jant.db".into(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Directory uploaded objects are written to
    pub root: PathBuf,
    /// URL prefix the objects are served under
    pub url_prefix: String,
    pub max_upload_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data/media"),
            url_prefix: "/media".into(),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Site defaults; values stored in the settings table take precedence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub description: String,
    /// Absolute origin used in feeds and sitemaps, e.g. `https://example.com`
    pub base_url: String,
    pub language: String,
    pub sqid_min_length: u8,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Jant".into(),
            description: String::new(),
            base_url: "http://127.0.0.1:3000".into(),
            language: "en".into(),
            sqid_min_length: 5,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Argon2 PHC hash of the management API token
    pub api_token_hash: Option<SecretString>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
    pub site: SiteConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Loads `.env`, then the file named by `JANT_CONFIG` (default
    /// `config/jant`), then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::from_sources(&path, Environment::with_prefix("JANT"))
    }

    /// Builds the configuration from an explicit file and environment source.
    pub fn from_sources(path: &str, env: Environment) -> Result<Self, ConfigError> {
        let cfg: AppConfig = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                env.prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be at least 1".into()));
        }
        if self.media.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("media.max_upload_bytes must be positive".into()));
        }
        if !self.media.url_prefix.starts_with('/') {
            return Err(ConfigError::Invalid("media.url_prefix must start with '/'".into()));
        }
        let base = &self.site.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "site.base_url must be an http(s) origin, got '{base}'"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("JANT").source(Some(map))
    }

    #[test]
    fn defaults_apply_without_sources() {
        let cfg = AppConfig::from_sources("does/not/exist", env(&[])).unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:3000");
        assert_eq!(cfg.server.log_format, LogFormat::Pretty);
        assert_eq!(cfg.database.url, "sqlite://jant.db");
        assert_eq!(cfg.site.sqid_min_length, 5);
        assert_eq!(cfg.media.max_upload_bytes, 20 * 1024 * 1024);
        assert!(cfg.auth.api_token_hash.is_none());
    }

    #[test]
    fn file_then_environment_override() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("jant.toml");
        std::fs::write(
            &file,
            "[server]\nbind = \"0.0.0.0:8080\"\nlog_format = \"json\"\n\n[site]\nname = \"From File\"\n",
        )
        .unwrap();

        let cfg = AppConfig::from_sources(
            file.to_str().unwrap(),
            env(&[
                ("JANT_SITE__NAME", "From Env"),
                ("JANT_DATABASE__MAX_CONNECTIONS", "9"),
                ("JANT_AUTH__API_TOKEN_HASH", "$argon2id$fake"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!(cfg.server.log_format, LogFormat::Json);
        assert_eq!(cfg.site.name, "From Env");
        assert_eq!(cfg.database.max_connections, 9);
        assert_eq!(
            cfg.auth.api_token_hash.as_ref().map(|s| s.expose_secret().to_string()),
            Some("$argon2id$fake".to_string())
        );
    }

    #[test]
    fn rejects_relative_base_url() {
        let err = AppConfig::from_sources("nope", env(&[("JANT_SITE__BASE_URL", "example.com")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
