//! Registry client abstraction.
//!
//! Drift detection needs one registry-side operation: resolving the
//! manifest digest a `registry/repo:tag` reference currently points at.
//! The [`RegistryInspector`] trait keeps that seam mockable; the real
//! implementation wraps `oci-distribution` with the selected credentials.

mod auth;
mod client;
mod reference;

use async_trait::async_trait;
use krar_core::Result;

pub use auth::CredentialResolver;
pub use client::OciRegistryInspector;
pub use reference::ImageReference;

/// Resolves registry-side manifest digests.
#[async_trait]
pub trait RegistryInspector: Send + Sync {
    /// Resolve the manifest digest for `image`, a full registry reference
    /// including the tag. Returns a `sha256:<hex>` string.
    ///
    /// Implementations must be safe for concurrent calls.
    async fn remote_digest(&self, image: &str) -> Result<String>;
}
