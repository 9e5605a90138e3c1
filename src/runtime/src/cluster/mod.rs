//! Cluster client abstraction.
//!
//! The pipeline consumes the Kubernetes API through the [`ClusterClient`]
//! trait: listing controllers and pods, collapsing ReplicaSet ownership,
//! patching pod templates, and creating audit events. The real
//! implementation wraps a kube client; tests substitute fakes.

mod kube;

use async_trait::async_trait;
use krar_core::{ControllerRef, NamespaceScope, Result};

pub use self::kube::KubeCluster;

/// A pod owner reference, as reported by the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRef {
    /// Owner kind (e.g. "ReplicaSet", "StatefulSet")
    pub kind: String,
    /// Owner name
    pub name: String,
    /// Whether this reference is marked as the managing controller
    pub controller: bool,
}

/// A container observation joining `status.containerStatuses` with the
/// matching `spec.containers` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerView {
    /// Container name
    pub name: String,
    /// Image reference with tag, from container status
    pub image: String,
    /// Registry-pullable digest form; may be empty while a pod starts up
    pub image_id: String,
    /// Declared `imagePullPolicy`, if any
    pub pull_policy: Option<String>,
}

/// A pod as the projection stage sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodView {
    /// Pod namespace
    pub namespace: String,
    /// Pod name
    pub name: String,
    /// Owner references from pod metadata
    pub owners: Vec<OwnerRef>,
    /// Container observations
    pub containers: Vec<ContainerView>,
}

impl PodView {
    /// The owner reference marked as the managing controller, if any.
    ///
    /// With multiple controller-marked references (pathological) the first
    /// wins.
    pub fn controller_owner(&self) -> Option<&OwnerRef> {
        self.owners.iter().find(|o| o.controller)
    }
}

/// Typed access to the Kubernetes API surface the pipeline needs.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// List controllers of `kind` matching `selector` within `scope`.
    ///
    /// `kind` is a workload kind in any case or number form (`deployment`,
    /// `Deployments`, ...); implementations resolve it to the API's
    /// collection form.
    async fn list_controllers(
        &self,
        kind: &str,
        selector: &str,
        scope: &NamespaceScope,
    ) -> Result<Vec<ControllerRef>>;

    /// List pods in `namespace`, or across all namespaces when `None`.
    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<PodView>>;

    /// Fetch the controlling owner of a ReplicaSet, if the ReplicaSet
    /// exists and has one.
    async fn replicaset_owner(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<OwnerRef>>;

    /// Patch the controller's pod template to trigger a rollout restart.
    async fn trigger_rollout(&self, target: &ControllerRef) -> Result<()>;

    /// Create an audit event in the target's namespace, bound to the target.
    async fn create_event(
        &self,
        target: &ControllerRef,
        reason: &str,
        message: &str,
    ) -> Result<()>;
}
