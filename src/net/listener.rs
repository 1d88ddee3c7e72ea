//! Listener units.
//!
//! # Responsibilities
//! - Bind the socket up front so bind failures surface synchronously
//! - Run the accept loop as its own task over the shared router
//! - Apply per-listener read/write/idle timeouts
//! - Stop on request, draining in-flight requests up to a deadline
//!
//! A listener stopping because it was asked to is not a failure; an accept
//! loop that ends on its own is logged and reported, and never touches the
//! sibling listener.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use hyper_util::server::conn::auto::Builder;
use tokio::task::JoinHandle;
use tower_http::timeout::TimeoutLayer;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::lifecycle::cleanup::ArtifactGuard;

/// How long a force-closed listener gets to unwind before its task is aborted.
const FORCE_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Which of the two listener units this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// HTTP on `http_port`.
    Plaintext,
    /// HTTPS on `https_port`.
    Encrypted,
}

impl ListenerKind {
    pub fn scheme(&self) -> &'static str {
        match self {
            ListenerKind::Plaintext => "http",
            ListenerKind::Encrypted => "https",
        }
    }

    /// `scheme://addr`, the base URL clients use for this unit.
    pub fn url(&self, addr: SocketAddr) -> String {
        format!("{}://{addr}", self.scheme())
    }
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerKind::Plaintext => f.write_str("plaintext"),
            ListenerKind::Encrypted => f.write_str("encrypted"),
        }
    }
}

/// Transport timeouts owned by one listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerTimeouts {
    /// Bound on reading request headers (HTTP/1). hyper also applies it to
    /// the wait for the next request, so it is the idle bound for HTTP/1
    /// keep-alive connections.
    pub read: Duration,
    /// Bound on producing a response; exceeded requests get 408.
    pub write: Duration,
    /// Keep-alive ping interval and timeout for idle HTTP/2 connections.
    /// Has no effect on HTTP/1.
    pub idle: Duration,
}

impl ListenerTimeouts {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            read: config.read_timeout(),
            write: config.write_timeout(),
            idle: config.idle_timeout(),
        }
    }

    fn apply(&self, builder: &mut Builder<TokioExecutor>) {
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(self.read);
        builder
            .http2()
            .timer(TokioTimer::new())
            .keep_alive_interval(self.idle)
            .keep_alive_timeout(self.idle);
    }
}

/// How a listener's serve loop ended.
#[derive(Debug)]
pub enum ListenerExit {
    /// Stopped after a deliberate request.
    Stopped,
    /// Ended on its own or with an error.
    Failed(io::Error),
}

impl ListenerExit {
    pub fn is_clean(&self) -> bool {
        matches!(self, ListenerExit::Stopped)
    }
}

/// Outcome of [`ListenerHandle::stop`].
#[derive(Debug)]
pub struct StopReport {
    pub kind: ListenerKind,
    pub exit: ListenerExit,
    /// True when connections were still open at the deadline and were cut.
    pub forced: bool,
    pub elapsed: Duration,
}

/// Bind a socket for `kind` on `addr` (`host:port`).
pub fn bind(kind: ListenerKind, addr: &str) -> Result<std::net::TcpListener, ServerError> {
    let socket = std::net::TcpListener::bind(addr).map_err(|source| ServerError::BindFailure {
        listener: kind,
        addr: addr.to_string(),
        source,
    })?;
    socket
        .set_nonblocking(true)
        .map_err(|source| ServerError::BindFailure {
            listener: kind,
            addr: addr.to_string(),
            source,
        })?;
    Ok(socket)
}

/// A running listener unit.
pub struct ListenerHandle {
    kind: ListenerKind,
    local_addr: SocketAddr,
    handle: Handle,
    stop_requested: Arc<AtomicBool>,
    task: JoinHandle<ListenerExit>,
}

impl ListenerHandle {
    /// Start serving `router` on an already-bound socket.
    ///
    /// With `tls` set the unit terminates TLS. `artifact` is released when
    /// the serve loop returns, whatever the cause.
    pub fn start(
        kind: ListenerKind,
        socket: std::net::TcpListener,
        router: Router,
        timeouts: ListenerTimeouts,
        tls: Option<RustlsConfig>,
        artifact: Option<ArtifactGuard>,
    ) -> Result<Self, ServerError> {
        let local_addr = socket.local_addr().map_err(|source| ServerError::BindFailure {
            listener: kind,
            addr: "<unknown>".to_string(),
            source,
        })?;

        let handle = Handle::new();
        let stop_requested = Arc::new(AtomicBool::new(false));
        let app = router
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeouts.write,
            ))
            .into_make_service();

        let task = match tls {
            None => {
                let mut server = axum_server::from_tcp(socket).handle(handle.clone());
                timeouts.apply(server.http_builder());
                tokio::spawn(run_unit(
                    kind,
                    local_addr,
                    server.serve(app),
                    stop_requested.clone(),
                    artifact,
                ))
            }
            Some(config) => {
                let mut server =
                    axum_server::from_tcp_rustls(socket, config).handle(handle.clone());
                timeouts.apply(server.http_builder());
                tokio::spawn(run_unit(
                    kind,
                    local_addr,
                    server.serve(app),
                    stop_requested.clone(),
                    artifact,
                ))
            }
        };

        metrics::counter!("muxd_listener_starts_total", "listener" => kind.to_string())
            .increment(1);
        tracing::info!(
            listener = %kind,
            url = %kind.url(local_addr),
            read_timeout = ?timeouts.read,
            write_timeout = ?timeouts.write,
            idle_timeout = ?timeouts.idle,
            "Listener started"
        );

        Ok(Self {
            kind,
            local_addr,
            handle,
            stop_requested,
            task,
        })
    }

    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn url(&self) -> String {
        self.kind.url(self.local_addr)
    }

    /// Whether the serve loop has already returned.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Connections currently being served.
    pub fn connection_count(&self) -> usize {
        self.handle.connection_count()
    }

    /// Stop accepting, let in-flight requests finish, and force-close
    /// whatever is still open once `grace` elapses.
    pub async fn stop(mut self, grace: Duration) -> StopReport {
        let started = Instant::now();
        self.stop_requested.store(true, Ordering::SeqCst);
        self.handle.graceful_shutdown(None);

        let (exit, forced) = match tokio::time::timeout(grace, &mut self.task).await {
            Ok(joined) => (flatten(joined), false),
            Err(_) => {
                let err = ServerError::DrainTimeout {
                    listener: self.kind,
                    grace,
                };
                tracing::warn!(
                    listener = %self.kind,
                    error_kind = err.kind(),
                    open_connections = self.handle.connection_count(),
                    "{err}, force-closing"
                );
                self.handle.shutdown();
                let exit = match tokio::time::timeout(FORCE_CLOSE_GRACE, &mut self.task).await {
                    Ok(joined) => flatten(joined),
                    Err(_) => {
                        self.task.abort();
                        ListenerExit::Failed(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "listener did not stop after force close",
                        ))
                    }
                };
                (exit, true)
            }
        };

        StopReport {
            kind: self.kind,
            exit,
            forced,
            elapsed: started.elapsed(),
        }
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("kind", &self.kind)
            .field("local_addr", &self.local_addr)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

fn flatten(joined: Result<ListenerExit, tokio::task::JoinError>) -> ListenerExit {
    joined.unwrap_or_else(|e| ListenerExit::Failed(io::Error::other(e.to_string())))
}

async fn run_unit<F>(
    kind: ListenerKind,
    addr: SocketAddr,
    serve: F,
    stop_requested: Arc<AtomicBool>,
    artifact: Option<ArtifactGuard>,
) -> ListenerExit
where
    F: std::future::Future<Output = io::Result<()>>,
{
    let result = serve.await;
    let exit = match result {
        Ok(()) if stop_requested.load(Ordering::SeqCst) => {
            tracing::info!(listener = %kind, address = %addr, "Listener stopped");
            ListenerExit::Stopped
        }
        Ok(()) => {
            tracing::error!(
                listener = %kind,
                address = %addr,
                error_kind = "accept_loop",
                "Listener stopped without a shutdown request"
            );
            ListenerExit::Failed(io::Error::other("serve loop ended unexpectedly"))
        }
        Err(e) => {
            tracing::error!(
                listener = %kind,
                address = %addr,
                error_kind = "accept_loop",
                error = %e,
                "Listener failed"
            );
            ListenerExit::Failed(e)
        }
    };

    drop(artifact);
    exit
}
