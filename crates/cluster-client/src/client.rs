//! Cluster client backed by the Kubernetes API server

use crate::cluster_trait::ClusterClientTrait;
use crate::convert;
use crate::error::ClusterError;
use crate::models::*;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{Namespace, Pod};
use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::Client;
use tracing::{debug, warn};

/// `ClusterClientTrait` implementation using `kube::Api`
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl std::fmt::Debug for KubeClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterClient").finish_non_exhaustive()
    }
}

impl KubeClusterClient {
    /// Create a new client from an existing `kube::Client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn pdb_api(&self, namespace: &str) -> Api<PodDisruptionBudget> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Converts every item, skipping (and logging) objects that cannot be converted
fn convert_all<T, U>(
    items: Vec<T>,
    kind: &str,
    namespace: &str,
    convert: impl Fn(&T) -> Result<U, ClusterError>,
) -> Vec<U> {
    items
        .iter()
        .filter_map(|item| match convert(item) {
            Ok(converted) => Some(converted),
            Err(e) => {
                warn!("Skipping {} in namespace {}: {}", kind, namespace, e);
                None
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl ClusterClientTrait for KubeClusterClient {
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ClusterError::from_kube(e, "namespaces"))?;

        Ok(list.items.into_iter().filter_map(|ns| ns.metadata.name).collect())
    }

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Workload>, ClusterError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ClusterError::from_kube(e, &format!("{}/deployments", namespace)))?;

        debug!("Listed {} Deployments in {}", list.items.len(), namespace);
        Ok(convert_all(list.items, "Deployment", namespace, |d| {
            convert::workload_from_deployment(d)
        }))
    }

    async fn list_stateful_sets(&self, namespace: &str) -> Result<Vec<Workload>, ClusterError> {
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ClusterError::from_kube(e, &format!("{}/statefulsets", namespace)))?;

        debug!("Listed {} StatefulSets in {}", list.items.len(), namespace);
        Ok(convert_all(list.items, "StatefulSet", namespace, |s| {
            convert::workload_from_stateful_set(s)
        }))
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodObservation>, ClusterError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ClusterError::from_kube(e, &format!("{}/pods", namespace)))?;

        debug!("Listed {} Pods in {}", list.items.len(), namespace);
        Ok(convert_all(list.items, "Pod", namespace, |p| convert::pod_observation(p)))
    }

    async fn list_pdbs(&self, namespace: &str) -> Result<Vec<DisruptionBudget>, ClusterError> {
        let list = self
            .pdb_api(namespace)
            .list(&ListParams::default())
            .await
            .map_err(|e| {
                ClusterError::from_kube(e, &format!("{}/poddisruptionbudgets", namespace))
            })?;

        debug!("Listed {} PodDisruptionBudgets in {}", list.items.len(), namespace);
        Ok(convert_all(list.items, "PodDisruptionBudget", namespace, |p| {
            convert::disruption_budget(p)
        }))
    }

    async fn get_pdb(&self, namespace: &str, name: &str) -> Result<DisruptionBudget, ClusterError> {
        let pdb = self
            .pdb_api(namespace)
            .get(name)
            .await
            .map_err(|e| ClusterError::from_kube(e, &format!("{}/{}", namespace, name)))?;

        convert::disruption_budget(&pdb)
    }

    async fn create_pdb(&self, pdb: &DisruptionBudget) -> Result<DisruptionBudget, ClusterError> {
        let object = convert::to_pod_disruption_budget(pdb);
        let created = self
            .pdb_api(&pdb.namespace)
            .create(&PostParams::default(), &object)
            .await
            .map_err(|e| ClusterError::from_kube(e, &pdb.key()))?;

        convert::disruption_budget(&created)
    }

    async fn delete_pdb(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.pdb_api(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| ClusterError::from_kube(e, &format!("{}/{}", namespace, name)))?;

        Ok(())
    }
}
