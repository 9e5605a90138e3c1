//! Pod projection.
//!
//! Enumerates pods across the relevant namespaces and projects each
//! container observation onto its canonical controller, keeping only
//! observations that are eligible for drift checking: owner in the target
//! set and an effective pull policy of `Always`.

use std::collections::BTreeSet;
use std::sync::Arc;

use krar_core::{ControllerRef, NamespaceScope, Result, RunConfig};

use crate::cluster::ClusterClient;
use crate::ownership::OwnershipResolver;

/// Image pull policy after applying the defaulting rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectivePullPolicy {
    /// The container pulls on every start
    Always,
    /// Any explicit policy other than `Always`
    Other,
}

impl EffectivePullPolicy {
    /// Classify a declared `imagePullPolicy`.
    ///
    /// Unset or empty is treated as `Always`: only `Always` guarantees a
    /// fresh pull on restart, and the API's own `:latest` defaulting
    /// already resolves to it.
    pub fn from_spec(policy: Option<&str>) -> Self {
        match policy {
            None => EffectivePullPolicy::Always,
            Some(p) if p.trim().is_empty() || p.trim() == "Always" => {
                EffectivePullPolicy::Always
            }
            Some(_) => EffectivePullPolicy::Other,
        }
    }
}

/// One eligible container observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodSample {
    /// Namespace of the observed pod
    pub namespace: String,
    /// Canonical controller owning the pod
    pub owner: ControllerRef,
    /// Container name
    pub container: String,
    /// Image reference with tag
    pub image: String,
    /// Observed digest form; may be empty
    pub image_id: String,
}

/// Project pods onto eligible `PodSample`s.
pub async fn project_pods(
    config: &RunConfig,
    cluster: Arc<dyn ClusterClient>,
    targets: &BTreeSet<ControllerRef>,
) -> Result<Vec<PodSample>> {
    let resolver = OwnershipResolver::new(cluster.clone());
    let mut samples = Vec::new();

    for namespace in projection_scopes(config, targets) {
        let pods = match cluster.list_pods(namespace.as_deref()).await {
            Ok(pods) => pods,
            Err(err) => {
                tracing::warn!(
                    namespace = namespace.as_deref().unwrap_or("<all>"),
                    error = %err,
                    "Failed to list pods; skipping namespace"
                );
                continue;
            }
        };

        for pod in pods {
            let Some(owner) = pod.controller_owner() else {
                continue;
            };
            let canonical = resolver.resolve(&pod.namespace, owner).await;
            if !targets.contains(&canonical) {
                continue;
            }

            for container in &pod.containers {
                match EffectivePullPolicy::from_spec(container.pull_policy.as_deref()) {
                    EffectivePullPolicy::Always => {}
                    EffectivePullPolicy::Other => {
                        tracing::warn!(
                            pod = %pod.name,
                            container = %container.name,
                            policy = container.pull_policy.as_deref().unwrap_or(""),
                            "Container pull policy is not Always; a restart would not refresh it, skipping"
                        );
                        continue;
                    }
                }
                samples.push(PodSample {
                    namespace: pod.namespace.clone(),
                    owner: canonical.clone(),
                    container: container.name.clone(),
                    image: container.image.clone(),
                    image_id: container.image_id.clone(),
                });
            }
        }
    }

    Ok(samples)
}

/// Namespaces to enumerate pods in.
///
/// One cluster-wide listing when label discovery ran unscoped; otherwise
/// the distinct namespaces of the target set.
fn projection_scopes(
    config: &RunConfig,
    targets: &BTreeSet<ControllerRef>,
) -> Vec<Option<String>> {
    if config.label_discovery_enabled() && config.namespaces == NamespaceScope::All {
        return vec![None];
    }
    let namespaces: BTreeSet<String> =
        targets.iter().map(|t| t.namespace.clone()).collect();
    namespaces.into_iter().map(Some).collect()
}
