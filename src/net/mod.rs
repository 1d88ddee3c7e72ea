//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured host:port
//!     → listener.rs (bind, accept loop, timeouts, drain)
//!     → tls.rs (bundle the chain, optional TLS handshake)
//!     → Hand off to the shared axum Router
//! ```
//!
//! # Design Decisions
//! - Sockets are bound before the unit is spawned, so bind errors are typed
//! - Each listener owns its socket and its timeouts
//! - TLS is optional and handled transparently by axum-server

pub mod listener;
pub mod tls;

pub use listener::{ListenerExit, ListenerHandle, ListenerKind, ListenerTimeouts, StopReport};
pub use tls::{build_bundle, CertificateBundle, BUNDLE_FILE_NAME};
