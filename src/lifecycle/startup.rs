//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind and start the plaintext listener (always)
//! - Materialize the certificate bundle and start the encrypted listener
//!   when a leaf certificate is configured
//!
//! # Design Decisions
//! - Only a plaintext bind failure is fatal; every TLS problem degrades the
//!   service to plaintext-only
//! - The bundle is built per startup and owned by the encrypted unit
//! - Each unit gets its own copy of the timeouts; the router is shared

use std::path::Path;

use axum::Router;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::lifecycle::cleanup::ArtifactGuard;
use crate::net::listener::{self, ListenerHandle, ListenerKind, ListenerTimeouts};
use crate::net::tls::{build_bundle, load_tls_config};

/// The listener units started by [`ListenerSupervisor::start`].
#[derive(Debug)]
pub struct Supervised {
    plaintext: ListenerHandle,
    encrypted: Option<ListenerHandle>,
}

impl Supervised {
    pub fn plaintext(&self) -> &ListenerHandle {
        &self.plaintext
    }

    pub fn encrypted(&self) -> Option<&ListenerHandle> {
        self.encrypted.as_ref()
    }

    /// Number of running listener units (1 or 2).
    pub fn listener_count(&self) -> usize {
        1 + usize::from(self.encrypted.is_some())
    }

    pub fn into_handles(self) -> Vec<ListenerHandle> {
        std::iter::once(self.plaintext).chain(self.encrypted).collect()
    }
}

/// Starts the plaintext and (optionally) encrypted listeners.
pub struct ListenerSupervisor {
    config: ServerConfig,
}

impl ListenerSupervisor {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Start the listener units over `router`.
    ///
    /// Returns an error only when the plaintext listener cannot bind.
    pub async fn start(&self, router: Router) -> Result<Supervised, ServerError> {
        let timeouts = ListenerTimeouts::from_config(&self.config);

        let socket = listener::bind(ListenerKind::Plaintext, &self.config.http_address())?;
        let plaintext = ListenerHandle::start(
            ListenerKind::Plaintext,
            socket,
            router.clone(),
            timeouts,
            None,
            None,
        )?;

        let encrypted = if self.config.tls_requested() {
            match self.start_encrypted(router, timeouts).await {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::error!(
                        error_kind = e.kind(),
                        error = %e,
                        "Encrypted listener not started, continuing plaintext-only"
                    );
                    None
                }
            }
        } else {
            tracing::info!("No TLS certificate configured, encrypted listener disabled");
            None
        };

        Ok(Supervised {
            plaintext,
            encrypted,
        })
    }

    async fn start_encrypted(
        &self,
        router: Router,
        timeouts: ListenerTimeouts,
    ) -> Result<ListenerHandle, ServerError> {
        let config = &self.config;
        if config.tls_key_path.is_empty() {
            return Err(ServerError::ConfigMissing {
                field: "tls_key_path",
            });
        }

        let bundle = build_bundle(
            Path::new(&config.tls_cert_path),
            config.tls_ca_paths.as_slice(),
            &config.temp_dir,
        )?;
        // From here on any early return drops the guard and removes the bundle.
        let artifact = ArtifactGuard::new(bundle);

        let tls = load_tls_config(artifact.bundle(), Path::new(&config.tls_key_path)).await?;
        let socket = listener::bind(ListenerKind::Encrypted, &config.https_address())?;

        tracing::info!(
            bundle = %artifact.bundle().path().display(),
            owned = artifact.bundle().is_owned(),
            "Starting encrypted listener"
        );
        ListenerHandle::start(
            ListenerKind::Encrypted,
            socket,
            router,
            timeouts,
            Some(tls),
            Some(artifact),
        )
    }
}
