//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! rules. All problems are reported at once rather than stopping at the first.

use std::fmt;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check the configuration, collecting every violation.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let server = &config.server;
    let mut errors = Vec::new();

    if server.host.trim().is_empty() {
        errors.push(ValidationError::new("server.host", "must not be empty"));
    }
    if server.http_port == 0 {
        errors.push(ValidationError::new("server.http_port", "must be non-zero"));
    }
    if server.https_port == 0 {
        errors.push(ValidationError::new("server.https_port", "must be non-zero"));
    }
    if server.http_port != 0 && server.http_port == server.https_port {
        errors.push(ValidationError::new(
            "server.https_port",
            format!("must differ from http_port ({})", server.http_port),
        ));
    }

    for (field, secs) in [
        ("server.write_timeout_secs", server.write_timeout_secs),
        ("server.read_timeout_secs", server.read_timeout_secs),
        ("server.idle_timeout_secs", server.idle_timeout_secs),
    ] {
        if secs == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if server.temp_dir.as_os_str().is_empty() {
        errors.push(ValidationError::new("server.temp_dir", "must not be empty"));
    }
    if !server.tls_ca_paths.is_empty() && !server.tls_requested() {
        errors.push(ValidationError::new(
            "server.tls_ca_paths",
            "CA certificates require tls_cert_path",
        ));
    }
    if server.tls_ca_paths.iter().any(|p| p.trim().is_empty()) {
        errors.push(ValidationError::new(
            "server.tls_ca_paths",
            "entries must not be empty",
        ));
    }

    if let Some(url) = &config.kube.api_url {
        if let Err(e) = url::Url::parse(url) {
            errors.push(ValidationError::new("kube.api_url", e.to_string()));
        }
    }
    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "observability.metrics_address",
                format!("`{addr}` is not a socket address"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
