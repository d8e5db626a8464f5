//! Reconciliation engine.
//!
//! One namespace at a time: take a snapshot of workloads, pods and PDBs,
//! plan creates and deletes from it, then apply the plan.
//! - `ownership`: which PDBs cover which workloads, and which are ours
//! - `ttl`: the non-ready TTL override
//! - `plan`: pure create/delete decisions
//! - `sync`: applying those decisions through the cluster client

pub mod ownership;
pub mod plan;
pub mod sync;
pub mod ttl;

#[cfg(test)]
mod plan_test;

use crate::error::ControllerError;
use chrono::Utc;
use cluster_client::{ClusterClientTrait, ClusterError};
use ownership::OwnershipMarker;
use plan::NamespaceSnapshot;
use std::sync::Arc;
use tracing::{debug, warn};
use ttl::TtlPolicy;

/// Settings shared by every namespace reconciliation
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub marker: OwnershipMarker,
    pub ttl: TtlPolicy,
    pub pdb_name_suffix: String,
}

/// Result of reconciling one namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceOutcome {
    pub namespace: String,
    pub created: usize,
    pub deleted: usize,
    pub failures: Vec<String>,
}

impl NamespaceOutcome {
    /// Turns collected mutation failures into an error, if there were any
    pub fn into_result(self) -> Result<NamespaceOutcome, ControllerError> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(ControllerError::Reconciliation {
                namespace: self.namespace,
                failures: self.failures,
            })
        }
    }
}

/// Reconciles PodDisruptionBudgets against workloads.
pub struct Reconciler {
    client: Arc<dyn ClusterClientTrait>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(client: Arc<dyn ClusterClientTrait>, config: ReconcilerConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &dyn ClusterClientTrait {
        self.client.as_ref()
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Reads everything the planner needs for `namespace`.
    ///
    /// Pods are only listed when some workload could be subject to the TTL.
    pub async fn snapshot(&self, namespace: &str) -> Result<NamespaceSnapshot, ClusterError> {
        let mut workloads = self.client.list_deployments(namespace).await?;
        workloads.extend(self.client.list_stateful_sets(namespace).await?);
        let pdbs = self.client.list_pdbs(namespace).await?;

        let pods = if workloads.iter().any(|w| self.config.ttl.may_apply(w)) {
            self.client.list_pods(namespace).await?
        } else {
            Vec::new()
        };

        Ok(NamespaceSnapshot {
            namespace: namespace.to_string(),
            workloads,
            pods,
            pdbs,
        })
    }

    /// Runs one snapshot, plan and sync cycle for `namespace`.
    ///
    /// Fails only if the snapshot cannot be taken; mutation failures are
    /// reported in the outcome.
    pub async fn reconcile_namespace(
        &self,
        namespace: &str,
    ) -> Result<NamespaceOutcome, ControllerError> {
        let snapshot = self.snapshot(namespace).await?;
        debug!(
            "Namespace {}: {} workloads, {} pods, {} PDBs",
            namespace,
            snapshot.workloads.len(),
            snapshot.pods.len(),
            snapshot.pdbs.len()
        );

        let plan = plan::plan(&snapshot, &self.config, Utc::now());

        for skipped in &plan.skipped {
            debug!("Not protecting {}/{}: {}", namespace, skipped.workload, skipped.verdict);
        }
        for overlap in &plan.overlaps {
            warn!(
                "PodDisruptionBudget {}/{} partially overlaps workload {} without selecting it",
                namespace, overlap.pdb, overlap.workload
            );
        }
        for conflict in &plan.conflicts {
            warn!(
                "Cannot create PodDisruptionBudget {}/{} for {}: name held by a PDB that does not select it and is not ours to delete",
                namespace, conflict.pdb, conflict.workload
            );
        }

        if plan.is_empty() {
            debug!("Namespace {} is in sync", namespace);
        }
        let outcome = sync::apply(self.client.as_ref(), &self.config.marker, &plan).await;

        Ok(NamespaceOutcome {
            namespace: namespace.to_string(),
            created: outcome.created.len(),
            deleted: outcome.deleted.len(),
            failures: outcome.failures,
        })
    }
}
