//! Target discovery.
//!
//! Resolves the canonical set of target controllers from the union of
//! label-selected resources and explicitly-listed references.

use std::collections::BTreeSet;

use krar_core::{ControllerRef, Result, RunConfig};

use crate::cluster::ClusterClient;

/// Discover the deduplicated target set.
///
/// Per-kind listing failures and malformed explicit targets are warnings;
/// the run proceeds with whatever was found. An empty result is the
/// caller's "nothing to do" signal, not an error.
pub async fn discover_targets(
    config: &RunConfig,
    cluster: &dyn ClusterClient,
) -> Result<BTreeSet<ControllerRef>> {
    let mut targets = BTreeSet::new();

    if config.label_discovery_enabled() {
        // label_discovery_enabled guarantees the triple is present
        let selector = config
            .label
            .as_ref()
            .map(|l| l.selector())
            .unwrap_or_default();
        for kind in &config.resource_kinds {
            match cluster
                .list_controllers(kind, &selector, &config.namespaces)
                .await
            {
                Ok(found) => {
                    tracing::debug!(
                        kind = %kind,
                        selector = %selector,
                        count = found.len(),
                        "Listed label-selected controllers"
                    );
                    targets.extend(found);
                }
                Err(err) => {
                    tracing::warn!(
                        kind = %kind,
                        error = %err,
                        "Failed to list controllers for kind; skipping"
                    );
                }
            }
        }
    }

    for raw in &config.explicit_targets {
        match ControllerRef::parse(raw) {
            Ok(target) => {
                targets.insert(target);
            }
            Err(err) => {
                tracing::warn!(
                    target = %raw,
                    error = %err,
                    "Skipping malformed explicit target"
                );
            }
        }
    }

    Ok(targets)
}
