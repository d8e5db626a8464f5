//! Controller-specific error types.
//!
//! This module defines error types specific to the PDB Controller
//! that are not covered by upstream library errors.

use cluster_client::ClusterError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the PDB Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes client setup error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Cluster API call failed
    #[error("Cluster API error: {0}")]
    Cluster(#[from] ClusterError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// One or more mutations in a namespace failed
    #[error("Reconciliation failed in namespace {namespace}: {}", .failures.join("; "))]
    Reconciliation {
        namespace: String,
        failures: Vec<String>,
    },
}
