//! Run orchestration.
//!
//! Sequences the pipeline: discover targets, then either restart them
//! directly (`rollout` mode) or project pods, check drift, and restart
//! the affected subset (`smart` mode).

use std::collections::BTreeSet;
use std::sync::Arc;

use krar_core::{ControllerRef, Mode, Result, RunConfig};

use crate::cluster::ClusterClient;
use crate::discover::discover_targets;
use crate::drift::{check_drift, DigestPair};
use crate::project::project_pods;
use crate::registry::RegistryInspector;
use crate::rollout::restart_targets;

/// Outcome of one run, rendered by the CLI.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Discovered target set, sorted
    pub targets: Vec<ControllerRef>,
    /// Digest comparisons performed in smart mode
    pub pairs: Vec<DigestPair>,
    /// Images with drift, sorted
    pub drifted_images: Vec<String>,
    /// Controllers whose pods run a drifted image, sorted
    pub candidates: Vec<ControllerRef>,
    /// Controllers actually patched
    pub restarted: Vec<ControllerRef>,
    /// Controllers a dry run would have patched
    pub would_restart: Vec<ControllerRef>,
}

/// Execute one run.
///
/// Fatal errors (configuration, missing capabilities) surface as `Err`;
/// everything else degrades to warnings and a possibly-smaller summary.
pub async fn run(
    config: &RunConfig,
    cluster: Arc<dyn ClusterClient>,
    registry: Arc<dyn RegistryInspector>,
) -> Result<RunSummary> {
    config.validate()?;

    let targets = discover_targets(config, cluster.as_ref()).await?;
    let mut summary = RunSummary {
        targets: targets.iter().cloned().collect(),
        ..Default::default()
    };

    if targets.is_empty() {
        tracing::info!("No target controllers discovered; nothing to do");
        return Ok(summary);
    }
    tracing::info!(
        count = targets.len(),
        mode = %config.mode,
        dry_run = config.dry_run,
        "Discovered target controllers"
    );

    match config.mode {
        Mode::Rollout => {
            if config.dry_run {
                summary.would_restart = targets.into_iter().collect();
            } else {
                summary.restarted = restart_targets(config, cluster.as_ref(), &targets).await;
            }
        }
        Mode::Smart => {
            let samples = project_pods(config, cluster.clone(), &targets).await?;
            if samples.is_empty() {
                tracing::info!("No eligible pods found under the target set");
                return Ok(summary);
            }

            let report = check_drift(&samples, registry).await;
            let candidates: BTreeSet<ControllerRef> = samples
                .iter()
                .filter(|s| report.drifted_images.contains(&s.image))
                .map(|s| s.owner.clone())
                .collect();

            summary.pairs = report.pairs;
            summary.drifted_images = report.drifted_images.into_iter().collect();
            summary.candidates = candidates.iter().cloned().collect();

            if summary.drifted_images.is_empty() {
                tracing::info!("No drift detected");
                return Ok(summary);
            }

            if !config.smart_restart {
                tracing::info!(
                    images = summary.drifted_images.len(),
                    controllers = candidates.len(),
                    "Drift detected; smart-restart disabled, reporting only"
                );
            } else if config.dry_run {
                summary.would_restart = candidates.into_iter().collect();
            } else {
                summary.restarted =
                    restart_targets(config, cluster.as_ref(), &candidates).await;
            }
        }
    }

    Ok(summary)
}
