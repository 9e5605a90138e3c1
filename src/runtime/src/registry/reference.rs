//! OCI image reference parsing.
//!
//! Parses references like `ghcr.io/org/app:v1.2` as reported in pod
//! container statuses into structured components.

use krar_core::{KrarError, Result};

/// Default registry when none is specified.
const DEFAULT_REGISTRY: &str = "docker.io";

/// Default tag when neither tag nor digest is specified.
const DEFAULT_TAG: &str = "latest";

/// Parsed OCI image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry hostname (e.g. "ghcr.io", "docker.io")
    pub registry: String,
    /// Repository path (e.g. "library/nginx", "org/app")
    pub repository: String,
    /// Tag (e.g. "latest", "v1.2")
    pub tag: Option<String>,
    /// Digest (e.g. "sha256:abc123...")
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse an image reference string.
    ///
    /// Supports:
    /// - `nginx` → docker.io/library/nginx:latest
    /// - `nginx:1.25` → docker.io/library/nginx:1.25
    /// - `org/app` → docker.io/org/app:latest
    /// - `ghcr.io/org/app:tag`
    /// - `ghcr.io/org/app@sha256:...` (with or without a tag)
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(invalid(reference, "empty image reference"));
        }

        // Split off the digest first.
        let (name_tag, digest) = match reference.rsplit_once('@') {
            Some((name_tag, digest)) => {
                if !digest.contains(':') {
                    return Err(invalid(reference, "digest must be of the form algorithm:hex"));
                }
                (name_tag, Some(digest.to_string()))
            }
            None => (reference, None),
        };

        // A colon after the last slash separates the tag, unless it is a
        // registry port (numeric, with no further path separator).
        let (name, tag) = match name_tag.rsplit_once(':') {
            Some((name, candidate))
                if !candidate.contains('/')
                    && !(name_tag.find('/').is_none()
                        && candidate.chars().all(|c| c.is_ascii_digit())) =>
            {
                (name, Some(candidate.to_string()))
            }
            _ => (name_tag, None),
        };

        let (registry, repository) = split_registry_repository(name, reference)?;

        // Apply the default tag only when there is no digest either.
        let tag = match (&tag, &digest) {
            (None, None) => Some(DEFAULT_TAG.to_string()),
            _ => tag,
        };

        Ok(ImageReference {
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// Render the full reference string.
    pub fn full_reference(&self) -> String {
        let mut s = format!("{}/{}", self.registry, self.repository);
        if let Some(ref tag) = self.tag {
            s.push(':');
            s.push_str(tag);
        }
        if let Some(ref digest) = self.digest {
            s.push('@');
            s.push_str(digest);
        }
        s
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_reference())
    }
}

fn invalid(reference: &str, message: &str) -> KrarError {
    KrarError::InvalidReference {
        reference: reference.to_string(),
        message: message.to_string(),
    }
}

/// Split a name into registry and repository components.
///
/// The first path component counts as a registry when it looks like a
/// hostname (contains a dot or a port, or is "localhost").
fn split_registry_repository(name: &str, reference: &str) -> Result<(String, String)> {
    if let Some((first, rest)) = name.split_once('/') {
        if first.contains('.') || first.contains(':') || first == "localhost" {
            if rest.is_empty() {
                return Err(invalid(reference, "empty repository"));
            }
            return Ok((first.to_string(), rest.to_string()));
        }
    }

    // No registry detected; default to Docker Hub conventions.
    let repository = if name.contains('/') {
        name.to_string()
    } else {
        format!("library/{name}")
    };
    Ok((DEFAULT_REGISTRY.to_string(), repository))
}
