//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (SERVER_*, APP_*, KUBE_*)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → owned copies handed to each listener unit
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - Every field has a default, so no file at all is a valid config
//! - serde handles shape, validation.rs handles meaning, and reports every
//!   problem at once

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, KubeConfig, ObservabilityConfig, ServerConfig, WebAppConfig};
