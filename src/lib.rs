//! Dual-listener HTTP service library.
//!
//! One axum application served over a plaintext listener and, when a leaf
//! certificate is configured, an encrypted listener built from an on-disk
//! certificate bundle. Shutdown drains both under one deadline.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;

// Application
pub mod token;
pub mod version;

// Cross-cutting concerns
pub mod cli;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use error::ServerError;
pub use http::{build_router, AppState};
pub use lifecycle::{ListenerSupervisor, ShutdownCoordinator, ShutdownSignal};
