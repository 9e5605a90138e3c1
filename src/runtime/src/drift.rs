//! Drift detection.
//!
//! Compares the digest a pod is actually running (its `imageID`) with the
//! digest the registry currently serves for the same tag. A mismatch means
//! the tag was repointed after the pod started.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::StreamExt;

use crate::project::PodSample;
use crate::registry::RegistryInspector;

/// Max concurrent registry lookups.
const LOOKUP_CONCURRENCY: usize = 4;

/// Comparison of a locally-observed digest with the registry-side digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestPair {
    /// Image reference with tag
    pub image: String,
    /// Normalized local digest
    pub local: String,
    /// Registry-side digest; empty when the lookup failed
    pub remote: String,
    /// Both digests non-empty and unequal
    pub drifted: bool,
}

/// Result of a drift check over all eligible samples.
#[derive(Debug, Default)]
pub struct DriftReport {
    /// One row per unique `(image, local digest)` observation
    pub pairs: Vec<DigestPair>,
    /// Images with at least one drifted observation
    pub drifted_images: BTreeSet<String>,
}

/// Normalize a pod `imageID` into canonical `sha256:<hex>` form.
///
/// Accepts the pullable form (`registry/repo@sha256:<hex>`) and the bare
/// digest form, with or without the `sha256:` prefix. Returns `None` for
/// an empty digest.
pub fn normalize_local_digest(image_id: &str) -> Option<String> {
    let digest = match image_id.rsplit_once('@') {
        Some((_, digest)) => digest,
        None => image_id,
    };
    let digest = digest.trim();
    if digest.is_empty() {
        return None;
    }
    let hex = digest.strip_prefix("sha256:").unwrap_or(digest);
    Some(format!("sha256:{hex}"))
}

/// Check every unique image reference for drift.
///
/// Registry failures (after the client's own retries) leave the image
/// unclassified: it is neither fresh nor drifted, and the run continues.
pub async fn check_drift(
    samples: &[PodSample],
    registry: Arc<dyn RegistryInspector>,
) -> DriftReport {
    // Unique images, each with the set of normalized local digests
    // observed across pods.
    let mut locals: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for sample in samples {
        match normalize_local_digest(&sample.image_id) {
            Some(digest) => {
                locals
                    .entry(sample.image.clone())
                    .or_default()
                    .insert(digest);
            }
            None => {
                tracing::warn!(
                    image = %sample.image,
                    container = %sample.container,
                    "Pod reports no usable image digest; skipping"
                );
            }
        }
    }

    let lookups = futures::stream::iter(locals.into_iter().map(|(image, digests)| {
        let registry = registry.clone();
        async move {
            let remote = match registry.remote_digest(&image).await {
                Ok(remote) if remote.trim().is_empty() => {
                    tracing::warn!(image = %image, "Registry returned an empty digest; skipping");
                    None
                }
                Ok(remote) => Some(remote),
                Err(err) => {
                    tracing::warn!(
                        image = %image,
                        error = %err,
                        "Registry inspection failed; image remains unclassified"
                    );
                    None
                }
            };
            (image, digests, remote)
        }
    }))
    .buffer_unordered(LOOKUP_CONCURRENCY)
    .collect::<Vec<_>>()
    .await;

    let mut report = DriftReport::default();
    for (image, digests, remote) in lookups {
        for local in digests {
            let remote = remote.clone().unwrap_or_default();
            let drifted = !remote.is_empty() && local != remote;
            if drifted {
                report.drifted_images.insert(image.clone());
            }
            report.pairs.push(DigestPair {
                image: image.clone(),
                local,
                remote,
                drifted,
            });
        }
    }
    // buffer_unordered scrambles completion order
    report
        .pairs
        .sort_by(|a, b| (&a.image, &a.local).cmp(&(&b.image, &b.local)));
    report
}
