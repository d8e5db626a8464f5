//! Mock ClusterClient for unit testing
//!
//! This module provides an in-memory implementation of ClusterClientTrait
//! that can be used in unit tests without a running cluster. It records
//! every mutation and can be told to fail specific namespaces or creates.

use crate::cluster_trait::ClusterClientTrait;
use crate::error::ClusterError;
use crate::models::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

type ObjectKey = (String, String);

/// Mock ClusterClient for testing
///
/// Objects are keyed by `(namespace, name)` and listed in name order.
#[derive(Clone, Default)]
pub struct MockClusterClient {
    namespaces: Arc<Mutex<BTreeSet<String>>>,
    deployments: Arc<Mutex<BTreeMap<ObjectKey, Workload>>>,
    stateful_sets: Arc<Mutex<BTreeMap<ObjectKey, Workload>>>,
    pods: Arc<Mutex<BTreeMap<ObjectKey, PodObservation>>>,
    pdbs: Arc<Mutex<BTreeMap<ObjectKey, DisruptionBudget>>>,
    // Failure injection
    failing_namespaces: Arc<Mutex<BTreeSet<String>>>,
    failing_creates: Arc<Mutex<BTreeSet<ObjectKey>>>,
    // Call recording
    created: Arc<Mutex<Vec<String>>>,
    deleted: Arc<Mutex<Vec<String>>>,
    namespace_lists: Arc<Mutex<usize>>,
    pod_lists: Arc<Mutex<usize>>,
}

impl std::fmt::Debug for MockClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockClusterClient")
            .field("namespaces", &self.namespaces.lock().unwrap().len())
            .field("pdbs", &self.pdbs.lock().unwrap().len())
            .finish_non_exhaustive()
    }
}

fn key(namespace: &str, name: &str) -> ObjectKey {
    (namespace.to_string(), name.to_string())
}

impl MockClusterClient {
    /// Create an empty mock cluster
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace (for test setup)
    pub fn add_namespace(&self, namespace: impl Into<String>) {
        self.namespaces.lock().unwrap().insert(namespace.into());
    }

    /// Add a Deployment or StatefulSet, depending on its kind (for test setup)
    pub fn add_workload(&self, workload: Workload) {
        let k = key(&workload.namespace, &workload.name);
        match workload.kind {
            WorkloadKind::Deployment => self.deployments.lock().unwrap().insert(k, workload),
            WorkloadKind::StatefulSet => self.stateful_sets.lock().unwrap().insert(k, workload),
        };
    }

    /// Remove a workload (simulates deletion between passes)
    pub fn remove_workload(&self, kind: WorkloadKind, namespace: &str, name: &str) {
        let k = key(namespace, name);
        match kind {
            WorkloadKind::Deployment => self.deployments.lock().unwrap().remove(&k),
            WorkloadKind::StatefulSet => self.stateful_sets.lock().unwrap().remove(&k),
        };
    }

    /// Add a pod (for test setup)
    pub fn add_pod(&self, pod: PodObservation) {
        self.pods.lock().unwrap().insert(key(&pod.namespace, &pod.name), pod);
    }

    /// Add a PDB directly, bypassing call recording (for test setup)
    pub fn add_pdb(&self, pdb: DisruptionBudget) {
        self.pdbs.lock().unwrap().insert(key(&pdb.namespace, &pdb.name), pdb);
    }

    /// Make every list call in `namespace` fail with an API error
    pub fn fail_namespace(&self, namespace: impl Into<String>) {
        self.failing_namespaces.lock().unwrap().insert(namespace.into());
    }

    /// Make creating the PDB `namespace/name` fail with an API error
    pub fn fail_create(&self, namespace: &str, name: &str) {
        self.failing_creates.lock().unwrap().insert(key(namespace, name));
    }

    /// Current PDB `namespace/name`, if any
    pub fn pdb(&self, namespace: &str, name: &str) -> Option<DisruptionBudget> {
        self.pdbs.lock().unwrap().get(&key(namespace, name)).cloned()
    }

    /// Names of the PDBs currently in `namespace`
    pub fn pdb_names(&self, namespace: &str) -> Vec<String> {
        self.pdbs
            .lock()
            .unwrap()
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// `namespace/name` of every PDB created through the trait, in call order
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    /// `namespace/name` of every PDB deleted through the trait, in call order
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    /// Number of `list_namespaces` calls so far
    pub fn namespace_list_count(&self) -> usize {
        *self.namespace_lists.lock().unwrap()
    }

    /// Number of `list_pods` calls so far
    pub fn pod_list_count(&self) -> usize {
        *self.pod_lists.lock().unwrap()
    }

    fn check_namespace(&self, namespace: &str) -> Result<(), ClusterError> {
        if self.failing_namespaces.lock().unwrap().contains(namespace) {
            return Err(ClusterError::Api(format!(
                "injected failure for namespace {}",
                namespace
            )));
        }
        Ok(())
    }

    fn list_in<T: Clone>(map: &Mutex<BTreeMap<ObjectKey, T>>, namespace: &str) -> Vec<T> {
        map.lock()
            .unwrap()
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, value)| value.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for MockClusterClient {
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        *self.namespace_lists.lock().unwrap() += 1;
        Ok(self.namespaces.lock().unwrap().iter().cloned().collect())
    }

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Workload>, ClusterError> {
        self.check_namespace(namespace)?;
        Ok(Self::list_in(&self.deployments, namespace))
    }

    async fn list_stateful_sets(&self, namespace: &str) -> Result<Vec<Workload>, ClusterError> {
        self.check_namespace(namespace)?;
        Ok(Self::list_in(&self.stateful_sets, namespace))
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodObservation>, ClusterError> {
        self.check_namespace(namespace)?;
        *self.pod_lists.lock().unwrap() += 1;
        Ok(Self::list_in(&self.pods, namespace))
    }

    async fn list_pdbs(&self, namespace: &str) -> Result<Vec<DisruptionBudget>, ClusterError> {
        self.check_namespace(namespace)?;
        Ok(Self::list_in(&self.pdbs, namespace))
    }

    async fn get_pdb(&self, namespace: &str, name: &str) -> Result<DisruptionBudget, ClusterError> {
        self.pdb(namespace, name)
            .ok_or_else(|| ClusterError::NotFound(format!("{}/{}", namespace, name)))
    }

    async fn create_pdb(&self, pdb: &DisruptionBudget) -> Result<DisruptionBudget, ClusterError> {
        let k = key(&pdb.namespace, &pdb.name);
        if self.failing_creates.lock().unwrap().contains(&k) {
            return Err(ClusterError::Api(format!("injected create failure for {}", pdb.key())));
        }

        let mut pdbs = self.pdbs.lock().unwrap();
        if pdbs.contains_key(&k) {
            return Err(ClusterError::AlreadyExists(pdb.key()));
        }
        pdbs.insert(k, pdb.clone());
        self.created.lock().unwrap().push(pdb.key());
        Ok(pdb.clone())
    }

    async fn delete_pdb(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let removed = self.pdbs.lock().unwrap().remove(&key(namespace, name));
        match removed {
            Some(pdb) => {
                self.deleted.lock().unwrap().push(pdb.key());
                Ok(())
            }
            None => Err(ClusterError::NotFound(format!("{}/{}", namespace, name))),
        }
    }
}
