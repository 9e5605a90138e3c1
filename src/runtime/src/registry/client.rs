//! OCI registry digest inspector.
//!
//! Uses the `oci-distribution` crate to resolve the manifest digest a
//! tag currently points at, with bounded retries for transient failures.

use std::time::Duration;

use async_trait::async_trait;
use oci_distribution::client::{ClientConfig, ClientProtocol};
use oci_distribution::secrets::RegistryAuth as OciRegistryAuth;
use oci_distribution::{Client, Reference};

use krar_core::{KrarError, RegistryAuthSpec, Result};

use super::auth::CredentialResolver;
use super::reference::ImageReference;
use super::RegistryInspector;

/// Attempts per image before giving up.
const INSPECT_ATTEMPTS: u32 = 3;

/// Base delay between attempts; grows linearly.
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Registry inspector backed by `oci-distribution`.
pub struct OciRegistryInspector {
    client: Client,
    credentials: CredentialResolver,
}

impl OciRegistryInspector {
    /// Create an inspector using the selected auth material.
    pub fn new(auth: RegistryAuthSpec) -> Self {
        let config = ClientConfig {
            protocol: ClientProtocol::Https,
            ..Default::default()
        };
        Self {
            client: Client::new(config),
            credentials: CredentialResolver::new(auth),
        }
    }
}

#[async_trait]
impl RegistryInspector for OciRegistryInspector {
    async fn remote_digest(&self, image: &str) -> Result<String> {
        let parsed = ImageReference::parse(image)?;

        let auth = match self.credentials.resolve(&parsed.registry)? {
            Some((username, password)) => OciRegistryAuth::Basic(username, password),
            None => OciRegistryAuth::Anonymous,
        };

        let full_ref = parsed.full_reference();
        let oci_ref: Reference = full_ref.parse().map_err(|e| KrarError::InvalidReference {
            reference: full_ref.clone(),
            message: format!("not a valid OCI reference: {e}"),
        })?;

        let mut last_error = String::new();
        for attempt in 1..=INSPECT_ATTEMPTS {
            match self.client.pull_manifest(&oci_ref, &auth).await {
                Ok((_manifest, digest)) => return Ok(digest),
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(
                        image = %full_ref,
                        attempt,
                        error = %last_error,
                        "Registry inspection attempt failed"
                    );
                    if attempt < INSPECT_ATTEMPTS {
                        tokio::time::sleep(RETRY_DELAY * attempt).await;
                    }
                }
            }
        }

        Err(KrarError::Registry {
            registry: parsed.registry,
            message: format!(
                "failed to resolve digest after {INSPECT_ATTEMPTS} attempts: {last_error}"
            ),
        })
    }
}
