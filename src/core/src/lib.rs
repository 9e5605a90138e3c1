//! krar Core - Foundational Types
//!
//! This module provides the foundational types shared across the krar
//! rollout helper: the error taxonomy, the immutable run configuration,
//! and controller references.

pub mod config;
pub mod error;
pub mod target;

// Re-export commonly used types
pub use config::{LabelSelector, Mode, NamespaceScope, RegistryAuthSpec, RunConfig};
pub use error::{KrarError, Result};
pub use target::ControllerRef;

/// krar version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
