//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bind plaintext → Build bundle → Load TLS → Bind encrypted
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Stopped
//!
//! Signals (signals.rs):
//!     SIGINT → ShutdownSignal raised once
//!
//! Cleanup (cleanup.rs):
//!     Encrypted serve loop returns → Remove owned bundle
//! ```
//!
//! # Design Decisions
//! - Ordered startup: plaintext first, TLS failures never block it
//! - Shutdown has a deadline: forced close after it
//! - Bundle removal is tied to the encrypted unit, not to the coordinator

pub mod cleanup;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use cleanup::ArtifactGuard;
pub use shutdown::{ShutdownCoordinator, ShutdownPhase, ShutdownReport, DEFAULT_GRACE_PERIOD};
pub use signals::ShutdownSignal;
pub use startup::{ListenerSupervisor, Supervised};
