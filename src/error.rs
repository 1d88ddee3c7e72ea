//! Error taxonomy for the listener lifecycle.
//!
//! Every variant is recovered locally by the component that detects it,
//! except [`ServerError::BindFailure`] on the plaintext listener, which is
//! handed back to `main` and turned into a non-zero exit.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::net::listener::ListenerKind;

/// Failures raised while bringing listeners up or tearing them down.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A required path is absent from the configuration.
    #[error("configuration is missing `{field}`")]
    ConfigMissing { field: &'static str },

    /// A certificate, key, or bundle file could not be read.
    #[error("unable to read {}: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The bundle could not be written to its destination directory.
    #[error("unable to write certificate bundle {}: {source}", path.display())]
    BundleWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The bundle and key could not be turned into a TLS server config.
    #[error("invalid TLS material in {}: {source}", path.display())]
    TlsConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A listener could not acquire its socket.
    #[error("{listener} listener failed to bind {addr}: {source}")]
    BindFailure {
        listener: ListenerKind,
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Graceful drain did not finish before the deadline.
    #[error("{listener} listener did not drain within {grace:?}")]
    DrainTimeout {
        listener: ListenerKind,
        grace: Duration,
    },

    /// The bundle file could not be removed after use.
    #[error("failed to remove {}: {source}", path.display())]
    CleanupFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ServerError {
    /// Short, stable name used as the `error_kind` field on log events.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::ConfigMissing { .. } => "config_missing",
            ServerError::FileUnreadable { .. } => "file_unreadable",
            ServerError::BundleWrite { .. } => "bundle_write",
            ServerError::TlsConfig { .. } => "tls_config",
            ServerError::BindFailure { .. } => "bind_failure",
            ServerError::DrainTimeout { .. } => "drain_timeout",
            ServerError::CleanupFailure { .. } => "cleanup_failure",
        }
    }

    /// Whether this error must stop the process.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ServerError::BindFailure {
                listener: ListenerKind::Plaintext,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_plaintext_bind_failure_is_fatal() {
        let plaintext = ServerError::BindFailure {
            listener: ListenerKind::Plaintext,
            addr: "0.0.0.0:8080".into(),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        let encrypted = ServerError::BindFailure {
            listener: ListenerKind::Encrypted,
            addr: "0.0.0.0:8443".into(),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        let missing = ServerError::ConfigMissing {
            field: "tls_key_path",
        };

        assert!(plaintext.is_fatal());
        assert!(!encrypted.is_fatal());
        assert!(!missing.is_fatal());
        assert_eq!(plaintext.kind(), "bind_failure");
    }

    #[test]
    fn display_names_offending_path() {
        let err = ServerError::FileUnreadable {
            path: PathBuf::from("/certs/ca1.pem"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/certs/ca1.pem"));
    }
}
