//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every field has a default so an empty file (or no file) is valid.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and TLS settings.
    pub server: ServerConfig,

    /// Static content served under `/app`, `/styles`, `/images`, `/scripts`.
    pub web_app: WebAppConfig,

    /// Kubernetes API used by the bearer-token exchange.
    pub kube: KubeConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Settings for the plaintext and encrypted listeners.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host shared by both listeners.
    pub host: String,

    /// Plaintext (HTTP) port.
    pub http_port: u16,

    /// Encrypted (HTTPS) port.
    pub https_port: u16,

    /// Leaf certificate (PEM). Empty disables the encrypted listener.
    pub tls_cert_path: String,

    /// Private key (PEM) matching the leaf certificate.
    pub tls_key_path: String,

    /// Intermediate and root CA certificates, in chain order.
    pub tls_ca_paths: Vec<String>,

    /// Upper bound on producing a response, in seconds.
    pub write_timeout_secs: u64,

    /// Upper bound on reading request headers, in seconds. Also bounds how
    /// long an idle HTTP/1 keep-alive connection is kept open.
    pub read_timeout_secs: u64,

    /// HTTP/2 keep-alive ping interval and timeout, in seconds.
    pub idle_timeout_secs: u64,

    /// Working directory for the certificate bundle.
    pub temp_dir: PathBuf,

    /// JSON file holding the build version snapshot.
    pub version_file: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 8080,
            https_port: 8443,
            tls_cert_path: String::new(),
            tls_key_path: String::new(),
            tls_ca_paths: Vec::new(),
            write_timeout_secs: 15,
            read_timeout_secs: 15,
            idle_timeout_secs: 60,
            temp_dir: PathBuf::from("."),
            version_file: PathBuf::from("version.json"),
        }
    }
}

impl ServerConfig {
    /// `host:http_port`.
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    /// `host:https_port`.
    pub fn https_address(&self) -> String {
        format!("{}:{}", self.host, self.https_port)
    }

    /// Whether an encrypted listener was requested.
    pub fn tls_requested(&self) -> bool {
        !self.tls_cert_path.is_empty()
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Static content configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WebAppConfig {
    /// Root directory of the static web app.
    pub content_dir: PathBuf,
}

impl Default for WebAppConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("./content"),
        }
    }
}

/// Kubernetes API access for service-account token lookups.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct KubeConfig {
    /// API server base URL (e.g. `https://kubernetes.default.svc`).
    /// When unset the token exchange route reports an error.
    pub api_url: Option<String>,

    /// File holding the bearer token used against the API server.
    pub token_path: PathBuf,

    /// Skip API server certificate verification.
    pub accept_invalid_certs: bool,
}

impl Default for KubeConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            token_path: PathBuf::from("/var/run/secrets/kubernetes.io/serviceaccount/token"),
            accept_invalid_certs: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,

    /// Address for the Prometheus scrape endpoint. Disabled when unset.
    pub metrics_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.http_address(), "0.0.0.0:8080");
        assert_eq!(config.server.https_address(), "0.0.0.0:8443");
        assert_eq!(config.server.idle_timeout(), Duration::from_secs(60));
        assert!(!config.server.tls_requested());
        assert_eq!(config.web_app.content_dir, PathBuf::from("./content"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            http_port = 9000
            tls_cert_path = "/certs/leaf.pem"
            tls_ca_paths = ["/certs/ca1.pem", "/certs/ca2.pem"]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.http_port, 9000);
        assert_eq!(config.server.https_port, 8443);
        assert!(config.server.tls_requested());
        assert_eq!(config.server.tls_ca_paths.len(), 2);
    }
}
