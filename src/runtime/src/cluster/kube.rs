//! Kubernetes-backed [`ClusterClient`] implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::api::core::v1::{Event, EventSource, ObjectReference, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use kube::api::{Api, DynamicObject, ListParams, Patch, PatchParams, PostParams};
use kube::core::{ApiResource, GroupVersionKind};
use kube::ResourceExt;

use krar_core::{ControllerRef, KrarError, NamespaceScope, Result};

use super::{ClusterClient, ContainerView, OwnerRef, PodView};

/// Pod-template annotation bumped to trigger a rollout restart.
///
/// Same contract `kubectl rollout restart` uses: any template change makes
/// the controller manager roll the pods.
pub const RESTART_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// Cluster client backed by the in-cluster (or kubeconfig) kube client.
#[derive(Clone)]
pub struct KubeCluster {
    client: kube::Client,
}

impl KubeCluster {
    /// Connect using the default client resolution (in-cluster service
    /// account, then local kubeconfig).
    pub async fn connect() -> Result<Self> {
        let client = kube::Client::try_default().await.map_err(|e| {
            KrarError::Capability(format!("cannot initialize cluster client: {e}"))
        })?;
        Ok(Self { client })
    }

    /// Wrap an existing kube client.
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }
}

/// Resolve a workload kind string to its apps/v1 API resource and
/// canonical kind.
///
/// Accepts any case and either number form; the API's collection name is
/// derived by lower-casing the canonical kind.
fn workload_resource(kind: &str) -> Option<(ApiResource, &'static str)> {
    let normalized = kind.trim().to_lowercase();
    let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
    let canonical = match singular {
        "deployment" => "Deployment",
        "statefulset" => "StatefulSet",
        "daemonset" => "DaemonSet",
        "replicaset" => "ReplicaSet",
        _ => return None,
    };
    let gvk = GroupVersionKind::gvk("apps", "v1", canonical);
    Some((ApiResource::from_gvk(&gvk), canonical))
}

fn pod_view(pod: Pod) -> PodView {
    let namespace = pod.metadata.namespace.clone().unwrap_or_default();
    let name = pod.metadata.name.clone().unwrap_or_default();

    let owners = pod
        .metadata
        .owner_references
        .unwrap_or_default()
        .into_iter()
        .map(|o| OwnerRef {
            kind: o.kind,
            name: o.name,
            controller: o.controller.unwrap_or(false),
        })
        .collect();

    // Pull policies live on the spec; observed images on the status.
    let policies: HashMap<String, Option<String>> = pod
        .spec
        .map(|spec| {
            spec.containers
                .into_iter()
                .map(|c| (c.name, c.image_pull_policy))
                .collect()
        })
        .unwrap_or_default();

    let containers = pod
        .status
        .and_then(|status| status.container_statuses)
        .unwrap_or_default()
        .into_iter()
        .map(|cs| ContainerView {
            pull_policy: policies.get(&cs.name).cloned().flatten(),
            name: cs.name,
            image: cs.image,
            image_id: cs.image_id,
        })
        .collect();

    PodView {
        namespace,
        name,
        owners,
        containers,
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn list_controllers(
        &self,
        kind: &str,
        selector: &str,
        scope: &NamespaceScope,
    ) -> Result<Vec<ControllerRef>> {
        let (ar, canonical) = workload_resource(kind)
            .ok_or_else(|| KrarError::Cluster(format!("unsupported controller kind '{kind}'")))?;

        let params = ListParams::default().labels(selector);
        let mut apis: Vec<Api<DynamicObject>> = Vec::new();
        match scope {
            NamespaceScope::All => {
                apis.push(Api::all_with(self.client.clone(), &ar));
            }
            NamespaceScope::List(namespaces) => {
                for ns in namespaces {
                    apis.push(Api::namespaced_with(self.client.clone(), ns, &ar));
                }
            }
        }

        let mut found = Vec::new();
        for api in apis {
            let list = api
                .list(&params)
                .await
                .map_err(|e| KrarError::Cluster(format!("listing {canonical}: {e}")))?;
            for obj in list {
                found.push(ControllerRef::new(
                    obj.namespace().unwrap_or_default(),
                    canonical,
                    obj.name_any(),
                ));
            }
        }
        Ok(found)
    }

    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<PodView>> {
        let api: Api<Pod> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let pods = api
            .list(&ListParams::default())
            .await
            .map_err(|e| KrarError::Cluster(format!("listing pods: {e}")))?;
        Ok(pods.into_iter().map(pod_view).collect())
    }

    async fn replicaset_owner(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<OwnerRef>> {
        let api: Api<ReplicaSet> = Api::namespaced(self.client.clone(), namespace);
        let rs = api.get_opt(name).await.map_err(|e| {
            KrarError::Cluster(format!("fetching replicaset {namespace}/{name}: {e}"))
        })?;
        Ok(rs
            .and_then(|rs| rs.metadata.owner_references)
            .and_then(|owners| {
                owners
                    .into_iter()
                    .find(|o| o.controller.unwrap_or(false))
            })
            .map(|o| OwnerRef {
                kind: o.kind,
                name: o.name,
                controller: true,
            }))
    }

    async fn trigger_rollout(&self, target: &ControllerRef) -> Result<()> {
        let (ar, canonical) = workload_resource(&target.kind).ok_or_else(|| {
            KrarError::Cluster(format!("unsupported controller kind '{}'", target.kind))
        })?;
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), &target.namespace, &ar);

        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let patch = serde_json::json!({
            "spec": {
                "template": {
                    "metadata": {
                        "annotations": { RESTART_ANNOTATION: now }
                    }
                }
            }
        });
        api.patch(&target.name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(|e| {
                KrarError::Cluster(format!("patching {canonical} {target}: {e}"))
            })?;
        Ok(())
    }

    async fn create_event(
        &self,
        target: &ControllerRef,
        reason: &str,
        message: &str,
    ) -> Result<()> {
        let api: Api<Event> = Api::namespaced(self.client.clone(), &target.namespace);
        let now = Time(chrono::Utc::now());
        let event = Event {
            metadata: ObjectMeta {
                generate_name: Some(format!("{}-krar-", target.name)),
                namespace: Some(target.namespace.clone()),
                ..Default::default()
            },
            involved_object: ObjectReference {
                api_version: Some("apps/v1".to_string()),
                kind: Some(target.kind.clone()),
                name: Some(target.name.clone()),
                namespace: Some(target.namespace.clone()),
                ..Default::default()
            },
            reason: Some(reason.to_string()),
            message: Some(message.to_string()),
            type_: Some("Normal".to_string()),
            source: Some(EventSource {
                component: Some("krar".to_string()),
                ..Default::default()
            }),
            first_timestamp: Some(now.clone()),
            last_timestamp: Some(now),
            count: Some(1),
            ..Default::default()
        };
        api.create(&PostParams::default(), &event)
            .await
            .map_err(|e| KrarError::Cluster(format!("creating event for {target}: {e}")))?;
        Ok(())
    }
}
