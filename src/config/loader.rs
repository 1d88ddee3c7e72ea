//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Environment variable {var} has invalid value `{value}`")]
    Env { var: &'static str, value: String },
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overrides, then
/// validation.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay values from environment variables onto `config`.
///
/// `lookup` abstracts the environment so tests can supply their own values.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let server = &mut config.server;

    if let Some(v) = lookup("SERVER_HOST") {
        server.host = v;
    }
    if let Some(v) = lookup("SERVER_HTTP_PORT") {
        server.http_port = parse("SERVER_HTTP_PORT", v)?;
    }
    if let Some(v) = lookup("SERVER_HTTPS_PORT") {
        server.https_port = parse("SERVER_HTTPS_PORT", v)?;
    }
    if let Some(v) = lookup("SERVER_TLS_CERT_PATH") {
        server.tls_cert_path = v;
    }
    if let Some(v) = lookup("SERVER_TLS_KEY_PATH") {
        server.tls_key_path = v;
    }
    if let Some(v) = lookup("SERVER_TLS_CA_PATHS") {
        server.tls_ca_paths = v
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(v) = lookup("SERVER_WRITE_TIMEOUT") {
        server.write_timeout_secs = parse("SERVER_WRITE_TIMEOUT", v)?;
    }
    if let Some(v) = lookup("SERVER_READ_TIMEOUT") {
        server.read_timeout_secs = parse("SERVER_READ_TIMEOUT", v)?;
    }
    if let Some(v) = lookup("SERVER_IDLE_TIMEOUT") {
        server.idle_timeout_secs = parse("SERVER_IDLE_TIMEOUT", v)?;
    }
    if let Some(v) = lookup("SERVER_TEMP_DIR") {
        server.temp_dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("APP_VERSION_FILE") {
        server.version_file = PathBuf::from(v);
    }
    if let Some(v) = lookup("APP_CONTENT_DIR") {
        config.web_app.content_dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("KUBE_API_URL") {
        config.kube.api_url = Some(v);
    }
    if let Some(v) = lookup("KUBE_TOKEN_PATH") {
        config.kube.token_path = PathBuf::from(v);
    }
    if let Some(v) = lookup("LOG_JSON") {
        config.observability.json_logs = parse("LOG_JSON", v)?;
    }
    if let Some(v) = lookup("METRICS_ADDRESS") {
        config.observability.metrics_address = Some(v);
    }

    Ok(())
}

fn parse<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}
