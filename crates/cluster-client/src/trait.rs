//! ClusterClient trait for mocking
//!
//! This trait is the only way the controller reaches the cluster.
//! `KubeClusterClient` implements it against the API server, tests use
//! `MockClusterClient`.

use crate::error::ClusterError;
use crate::models::*;

/// Trait for the cluster operations the PDB controller needs
///
/// Every call is scoped to one namespace except `list_namespaces`.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterClientTrait: Send + Sync {
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError>;

    // Workloads
    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Workload>, ClusterError>;
    async fn list_stateful_sets(&self, namespace: &str) -> Result<Vec<Workload>, ClusterError>;

    // Pods
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodObservation>, ClusterError>;

    // PodDisruptionBudgets
    async fn list_pdbs(&self, namespace: &str) -> Result<Vec<DisruptionBudget>, ClusterError>;

    /// Fails with `ClusterError::NotFound` when the PDB does not exist
    async fn get_pdb(&self, namespace: &str, name: &str) -> Result<DisruptionBudget, ClusterError>;

    /// Fails with `ClusterError::AlreadyExists` when a PDB with that name exists
    async fn create_pdb(&self, pdb: &DisruptionBudget) -> Result<DisruptionBudget, ClusterError>;

    /// Fails with `ClusterError::NotFound` when the PDB does not exist
    async fn delete_pdb(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;
}
