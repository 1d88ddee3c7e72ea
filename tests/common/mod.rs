//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use muxd::config::ServerConfig;
use muxd::token::{TokenError, TokenIssuer};
use tempfile::TempDir;

/// Server settings bound to loopback on ephemeral ports.
pub fn server_config(temp_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        http_port: 0,
        https_port: 0,
        write_timeout_secs: 5,
        read_timeout_secs: 5,
        idle_timeout_secs: 5,
        temp_dir: temp_dir.to_path_buf(),
        ..ServerConfig::default()
    }
}

/// A self-signed leaf with its key and one extra CA certificate on disk.
pub struct TestCerts {
    pub dir: TempDir,
    pub leaf: PathBuf,
    pub key: PathBuf,
    pub ca: PathBuf,
}

impl TestCerts {
    pub fn generate() -> Self {
        let dir = TempDir::new().unwrap();

        let leaf_cert = rcgen::generate_simple_self_signed(vec!["localhost".into()]).unwrap();
        let ca_cert = rcgen::generate_simple_self_signed(vec!["test-ca".into()]).unwrap();

        let leaf = dir.path().join("server.crt");
        let key = dir.path().join("server.key");
        let ca = dir.path().join("ca.crt");
        fs::write(&leaf, leaf_cert.serialize_pem().unwrap()).unwrap();
        fs::write(&key, leaf_cert.serialize_private_key_pem()).unwrap();
        fs::write(&ca, ca_cert.serialize_pem().unwrap()).unwrap();

        Self { dir, leaf, key, ca }
    }

    /// Point `config` at these certificates.
    pub fn apply(&self, config: &mut ServerConfig, with_ca: bool) {
        config.tls_cert_path = self.leaf.display().to_string();
        config.tls_key_path = self.key.display().to_string();
        config.tls_ca_paths = if with_ca {
            vec![self.ca.display().to_string()]
        } else {
            Vec::new()
        };
    }
}

/// HTTP client that trusts any server certificate.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Issuer returning `tok-<namespace>-<account>`.
pub struct StaticIssuer;

#[async_trait]
impl TokenIssuer for StaticIssuer {
    async fn service_account_token(
        &self,
        namespace: &str,
        service_account: &str,
    ) -> Result<String, TokenError> {
        Ok(format!("tok-{namespace}-{service_account}"))
    }
}

/// Issuer that always fails with a lookup error.
pub struct FailingIssuer;

#[async_trait]
impl TokenIssuer for FailingIssuer {
    async fn service_account_token(
        &self,
        _namespace: &str,
        service_account: &str,
    ) -> Result<String, TokenError> {
        Err(TokenError::Status {
            secret: format!("{service_account}-token"),
            status: 404,
        })
    }
}
