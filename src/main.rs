//! muxd
//!
//! Serves one HTTP application over two listeners.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                    muxd                      │
//!   HTTP client ──────▶│  plaintext listener ─┐                       │
//!                      │                      ├──▶ shared axum Router │
//!   HTTPS client ─────▶│  encrypted listener ─┘      (api + static)   │
//!                      │        ▲                                      │
//!                      │        │ tlsCertBundle (leaf + CAs)           │
//!                      │                                              │
//!                      │  config · logging · metrics · lifecycle      │
//!                      └──────────────────────────────────────────────┘
//! ```
//!
//! Startup order: config → logging → metrics → version → router →
//! plaintext listener → bundle + encrypted listener. Ctrl-C drains both
//! listeners under `--graceful-timeout`.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use muxd::cli::Cli;
use muxd::config::load_config;
use muxd::http::{build_router, AppState};
use muxd::lifecycle::signals::forward_interrupt;
use muxd::lifecycle::{ListenerSupervisor, ShutdownCoordinator, ShutdownSignal};
use muxd::observability::{logging, metrics};
use muxd::token::{KubeSecretIssuer, TokenIssuer, UnconfiguredIssuer};
use muxd::version::load_version;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(false);
            tracing::error!(error = %e, "Configuration rejected");
            return ExitCode::FAILURE;
        }
    };
    logging::init_logging(config.observability.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "muxd starting");
    tracing::info!(
        http = %config.server.http_address(),
        https = %config.server.https_address(),
        tls = config.server.tls_requested(),
        ca_count = config.server.tls_ca_paths.len(),
        grace = ?cli.graceful_timeout,
        "Configuration loaded"
    );

    if let Some(addr) = &config.observability.metrics_address {
        match addr.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(metrics_address = %addr, error = %e, "Invalid metrics address"),
        }
    }

    let issuer: Arc<dyn TokenIssuer> = match KubeSecretIssuer::from_config(&config.kube) {
        Ok(Some(issuer)) => Arc::new(issuer),
        Ok(None) => {
            tracing::info!("No Kubernetes API configured, bearer-token exchange disabled");
            Arc::new(UnconfiguredIssuer)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build Kubernetes client, bearer-token exchange disabled");
            Arc::new(UnconfiguredIssuer)
        }
    };

    let state = AppState::new(load_version(&config.server.version_file), issuer);
    let router = build_router(state, &config.web_app.content_dir);

    // Before start: a Ctrl-C during startup must still drain and remove the bundle.
    let signal = ShutdownSignal::new();
    let interrupt = forward_interrupt(signal.clone());

    let supervisor = ListenerSupervisor::new(config.server);
    let supervised = match supervisor.start(router).await {
        Ok(supervised) => supervised,
        Err(e) => {
            tracing::error!(error_kind = e.kind(), error = %e, "Unable to start listeners");
            return ExitCode::FAILURE;
        }
    };

    let coordinator = ShutdownCoordinator::new(cli.graceful_timeout);
    let report = coordinator.run(signal.wait(), supervised).await;

    let handler_failed = if interrupt.is_finished() {
        matches!(interrupt.await, Ok(Err(_)))
    } else {
        interrupt.abort();
        false
    };

    tracing::info!(
        listeners = report.listeners.len(),
        clean = report.is_clean(),
        elapsed = ?report.elapsed,
        "Shutdown complete"
    );
    if handler_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
