//! Rollout execution.
//!
//! Triggers controller restarts and records an audit event per action.
//! Restart failures and event failures are per-target warnings; the run
//! continues with the remaining targets.

use std::collections::BTreeSet;

use krar_core::{ControllerRef, RunConfig};

use crate::cluster::ClusterClient;

/// Reason recorded on audit events.
pub const EVENT_REASON: &str = "KrarRolloutTriggered";

/// Restart every target, returning those actually patched.
///
/// The caller handles dry-run; this function always mutates.
pub async fn restart_targets(
    config: &RunConfig,
    cluster: &dyn ClusterClient,
    targets: &BTreeSet<ControllerRef>,
) -> Vec<ControllerRef> {
    let mut restarted = Vec::new();
    for target in targets {
        match cluster.trigger_rollout(target).await {
            Ok(()) => {
                tracing::info!(target = %target, "Triggered rollout restart");
                restarted.push(target.clone());

                let message = format!(
                    "krar restart triggered (mode={}, smart_restart={}, dry_run={})",
                    config.mode, config.smart_restart, config.dry_run
                );
                if let Err(err) = cluster.create_event(target, EVENT_REASON, &message).await {
                    tracing::warn!(
                        target = %target,
                        error = %err,
                        "Failed to create audit event"
                    );
                }
            }
            Err(err) => {
                tracing::warn!(
                    target = %target,
                    error = %err,
                    "Failed to trigger rollout restart"
                );
            }
        }
    }
    restarted
}
