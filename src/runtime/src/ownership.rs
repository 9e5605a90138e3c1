//! Ownership canonicalization.
//!
//! A pod created by a Deployment is owned by an intermediate ReplicaSet;
//! the controller a human names in a manifest is one hop up. This module
//! collapses that hop, memoizing ReplicaSet lookups for the run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use krar_core::ControllerRef;

use crate::cluster::{ClusterClient, OwnerRef};

/// The only kind treated as an intermediate indirection.
const INTERMEDIATE_KIND: &str = "ReplicaSet";

/// Resolves a pod's controlling owner to its canonical top-level
/// controller.
pub struct OwnershipResolver {
    cluster: Arc<dyn ClusterClient>,
    // (namespace, replicaset name) -> canonical controller
    cache: Mutex<HashMap<(String, String), ControllerRef>>,
}

impl OwnershipResolver {
    /// Create a resolver with an empty cache.
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self {
            cluster,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the canonical controller for a controlling owner reference.
    ///
    /// Non-ReplicaSet owners are already canonical. A ReplicaSet owner is
    /// replaced by its own controlling owner when one exists; a missing
    /// ReplicaSet or one without a controller leaves the input unchanged.
    /// Lookup failures degrade to the unchanged input and are not cached.
    pub async fn resolve(&self, namespace: &str, owner: &OwnerRef) -> ControllerRef {
        if owner.kind != INTERMEDIATE_KIND {
            return ControllerRef::new(namespace, &owner.kind, &owner.name);
        }

        let key = (namespace.to_string(), owner.name.clone());
        if let Some(hit) = self.cache.lock().unwrap().get(&key) {
            return hit.clone();
        }

        let resolved = match self.cluster.replicaset_owner(namespace, &owner.name).await {
            Ok(Some(parent)) => ControllerRef::new(namespace, parent.kind, parent.name),
            Ok(None) => ControllerRef::new(namespace, &owner.kind, &owner.name),
            Err(err) => {
                tracing::warn!(
                    namespace = %namespace,
                    replicaset = %owner.name,
                    error = %err,
                    "Failed to resolve ReplicaSet owner; keeping it as the controller"
                );
                return ControllerRef::new(namespace, &owner.kind, &owner.name);
            }
        };

        self.cache
            .lock()
            .unwrap()
            .insert(key, resolved.clone());
        resolved
    }

    /// Number of memoized ReplicaSet resolutions.
    #[cfg(test)]
    fn cached_entries(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use krar_core::{KrarError, NamespaceScope, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::cluster::PodView;

    /// Fake cluster that only answers ReplicaSet owner lookups.
    struct OwnerCluster {
        owner: Option<OwnerRef>,
        fail: bool,
        lookups: AtomicUsize,
    }

    impl OwnerCluster {
        fn new(owner: Option<OwnerRef>) -> Self {
            Self {
                owner,
                fail: false,
                lookups: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ClusterClient for OwnerCluster {
        async fn list_controllers(
            &self,
            _kind: &str,
            _selector: &str,
            _scope: &NamespaceScope,
        ) -> Result<Vec<ControllerRef>> {
            Ok(vec![])
        }

        async fn list_pods(&self, _namespace: Option<&str>) -> Result<Vec<PodView>> {
            Ok(vec![])
        }

        async fn replicaset_owner(
            &self,
            _namespace: &str,
            _name: &str,
        ) -> Result<Option<OwnerRef>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(KrarError::Cluster("unavailable".to_string()));
            }
            Ok(self.owner.clone())
        }

        async fn trigger_rollout(&self, _target: &ControllerRef) -> Result<()> {
            Ok(())
        }

        async fn create_event(
            &self,
            _target: &ControllerRef,
            _reason: &str,
            _message: &str,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn rs_owner(name: &str) -> OwnerRef {
        OwnerRef {
            kind: "ReplicaSet".to_string(),
            name: name.to_string(),
            controller: true,
        }
    }

    #[tokio::test]
    async fn test_non_replicaset_owner_unchanged() {
        let cluster = Arc::new(OwnerCluster::new(None));
        let resolver = OwnershipResolver::new(cluster.clone());

        let owner = OwnerRef {
            kind: "StatefulSet".to_string(),
            name: "db".to_string(),
            controller: true,
        };
        let resolved = resolver.resolve("ns", &owner).await;
        assert_eq!(resolved, ControllerRef::new("ns", "StatefulSet", "db"));
        assert_eq!(cluster.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_replicaset_collapses_one_hop() {
        let cluster = Arc::new(OwnerCluster::new(Some(OwnerRef {
            kind: "Deployment".to_string(),
            name: "app".to_string(),
            controller: true,
        })));
        let resolver = OwnershipResolver::new(cluster);

        let resolved = resolver.resolve("ns", &rs_owner("app-5d4f")).await;
        assert_eq!(resolved, ControllerRef::new("ns", "Deployment", "app"));
    }

    #[tokio::test]
    async fn test_orphan_replicaset_unchanged() {
        let cluster = Arc::new(OwnerCluster::new(None));
        let resolver = OwnershipResolver::new(cluster);

        let resolved = resolver.resolve("ns", &rs_owner("app-5d4f")).await;
        assert_eq!(resolved, ControllerRef::new("ns", "ReplicaSet", "app-5d4f"));
    }

    #[tokio::test]
    async fn test_lookup_memoized_per_replicaset() {
        let cluster = Arc::new(OwnerCluster::new(Some(OwnerRef {
            kind: "Deployment".to_string(),
            name: "app".to_string(),
            controller: true,
        })));
        let resolver = OwnershipResolver::new(cluster.clone());

        resolver.resolve("ns", &rs_owner("app-5d4f")).await;
        resolver.resolve("ns", &rs_owner("app-5d4f")).await;
        resolver.resolve("other", &rs_owner("app-5d4f")).await;

        assert_eq!(cluster.lookups.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.cached_entries(), 2);
    }

    #[tokio::test]
    async fn test_lookup_failure_degrades_and_is_not_cached() {
        let mut cluster = OwnerCluster::new(None);
        cluster.fail = true;
        let cluster = Arc::new(cluster);
        let resolver = OwnershipResolver::new(cluster.clone());

        let resolved = resolver.resolve("ns", &rs_owner("app-5d4f")).await;
        assert_eq!(resolved, ControllerRef::new("ns", "ReplicaSet", "app-5d4f"));
        assert_eq!(resolver.cached_entries(), 0);
    }
}
