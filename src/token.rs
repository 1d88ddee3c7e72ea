//! Service-account token issuing.
//!
//! The bearer-token route only needs "give me the token for this service
//! account"; [`TokenIssuer`] is that seam. [`KubeSecretIssuer`] answers it by
//! reading the `<account>-token` secret from the Kubernetes API.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::config::KubeConfig;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token issuer not configured")]
    NotConfigured,
    #[error("unable to read API credentials from {}: {source}", path.display())]
    Credentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request to the Kubernetes API failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("secret {secret} lookup returned HTTP {status}")]
    Status { secret: String, status: u16 },
    #[error("secret {secret} has no token")]
    MissingToken { secret: String },
    #[error("secret {secret} holds an undecodable token")]
    InvalidToken { secret: String },
}

/// Looks up service-account bearer tokens.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn service_account_token(
        &self,
        namespace: &str,
        service_account: &str,
    ) -> Result<String, TokenError>;
}

/// Issuer used when no Kubernetes API is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredIssuer;

#[async_trait]
impl TokenIssuer for UnconfiguredIssuer {
    async fn service_account_token(&self, _: &str, _: &str) -> Result<String, TokenError> {
        Err(TokenError::NotConfigured)
    }
}

#[derive(Debug, Deserialize)]
struct Secret {
    #[serde(default)]
    data: std::collections::HashMap<String, String>,
}

/// Reads `<account>-token` secrets through the Kubernetes REST API.
#[derive(Debug, Clone)]
pub struct KubeSecretIssuer {
    client: reqwest::Client,
    api_url: String,
    token_path: PathBuf,
}

impl KubeSecretIssuer {
    pub fn new(api_url: impl Into<String>, token_path: impl Into<PathBuf>, accept_invalid_certs: bool) -> Result<Self, TokenError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token_path: token_path.into(),
        })
    }

    /// Build the issuer named by `config`, or `None` when no API URL is set.
    pub fn from_config(config: &KubeConfig) -> Result<Option<Self>, TokenError> {
        config
            .api_url
            .as_ref()
            .map(|url| Self::new(url.clone(), config.token_path.clone(), config.accept_invalid_certs))
            .transpose()
    }

    async fn api_token(&self) -> Result<String, TokenError> {
        let raw = tokio::fs::read_to_string(&self.token_path)
            .await
            .map_err(|source| TokenError::Credentials {
                path: self.token_path.clone(),
                source,
            })?;
        Ok(raw.trim().to_string())
    }
}

#[async_trait]
impl TokenIssuer for KubeSecretIssuer {
    async fn service_account_token(
        &self,
        namespace: &str,
        service_account: &str,
    ) -> Result<String, TokenError> {
        let secret = format!("{service_account}-token");
        let url = format!(
            "{}/api/v1/namespaces/{namespace}/secrets/{secret}",
            self.api_url
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_token().await?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TokenError::Status {
                secret,
                status: response.status().as_u16(),
            });
        }

        let body: Secret = response.json().await?;
        decode_token(&secret, &body)
    }
}

fn decode_token(secret: &str, body: &Secret) -> Result<String, TokenError> {
    let encoded = body.data.get("token").ok_or_else(|| TokenError::MissingToken {
        secret: secret.to_string(),
    })?;
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| TokenError::InvalidToken {
            secret: secret.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|_| TokenError::InvalidToken {
        secret: secret.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(json: &str) -> Secret {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn decodes_base64_token() {
        let body = secret(r#"{"data":{"token":"c2VjcmV0LXRva2Vu"}}"#);
        assert_eq!(decode_token("argo-token", &body).unwrap(), "secret-token");
    }

    #[test]
    fn missing_token_field() {
        let body = secret(r#"{"data":{"ca.crt":"Zm9v"}}"#);
        assert!(matches!(
            decode_token("argo-token", &body),
            Err(TokenError::MissingToken { .. })
        ));
    }

    #[test]
    fn invalid_base64() {
        let body = secret(r#"{"data":{"token":"***"}}"#);
        assert!(matches!(
            decode_token("argo-token", &body),
            Err(TokenError::InvalidToken { .. })
        ));
    }

    #[test]
    fn no_api_url_means_no_issuer() {
        assert!(KubeSecretIssuer::from_config(&KubeConfig::default())
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn unconfigured_issuer_errors() {
        let err = UnconfiguredIssuer
            .service_account_token("ns", "sa")
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::NotConfigured));
    }
}
