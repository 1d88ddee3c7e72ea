//! HTTP application layer.
//!
//! # Data Flow
//! ```text
//! Listener unit (plaintext or encrypted)
//!     → server.rs (shared Router, middleware)
//!     → request.rs (request ID)
//!     → handlers.rs (ping, health, version, bearer-token)
//!     → response.rs (envelope)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{build_router, AppState};
