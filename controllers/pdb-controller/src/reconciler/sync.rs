//! Applies a plan against the cluster.
//!
//! Creates run before deletes, so a workload whose PDB is being replaced
//! is never left without one for longer than the gap between two calls.
//! The one exception is a replacement that reuses the name of the PDB it
//! replaces: it is created right after the deletes. Every mutation is
//! attempted; failures are collected rather than aborting the rest of the
//! plan.

use super::ownership::OwnershipMarker;
use super::plan::{Plan, PlannedDelete};
use cluster_client::{ClusterClientTrait, ClusterError, DisruptionBudget};
use tracing::{debug, error, info, warn};

/// What happened when a plan was applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub created: Vec<String>,
    pub deleted: Vec<String>,
    pub failures: Vec<String>,
}

/// Creates `pdb`. Returns `false` if it already existed.
pub async fn create_pdb(
    client: &dyn ClusterClientTrait,
    pdb: &DisruptionBudget,
) -> Result<bool, ClusterError> {
    match client.create_pdb(pdb).await {
        Ok(_) => {
            info!(
                "Created PodDisruptionBudget {} (minAvailable: {})",
                pdb.key(),
                pdb.min_available.unwrap_or_default()
            );
            Ok(true)
        }
        Err(e) if e.is_already_exists() => {
            debug!("PodDisruptionBudget {} already exists", pdb.key());
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Deletes a managed PDB after re-reading it.
///
/// Returns `false` if the PDB is already gone or no longer carries the
/// marker, in which case it is left alone.
pub async fn delete_managed_pdb(
    client: &dyn ClusterClientTrait,
    marker: &OwnershipMarker,
    namespace: &str,
    planned: &PlannedDelete,
) -> Result<bool, ClusterError> {
    let current = match client.get_pdb(namespace, &planned.name).await {
        Ok(pdb) => pdb,
        Err(e) if e.is_not_found() => {
            debug!("PodDisruptionBudget {}/{} already gone", namespace, planned.name);
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    if !marker.owns(&current) {
        warn!(
            "PodDisruptionBudget {} lost the {}={} label, leaving it in place",
            current.key(),
            marker.key(),
            marker.value()
        );
        return Ok(false);
    }

    match client.delete_pdb(namespace, &planned.name).await {
        Ok(()) => {
            info!(
                "Deleted PodDisruptionBudget {} ({})",
                current.key(),
                planned.reason
            );
            Ok(true)
        }
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

async fn create_all(
    client: &dyn ClusterClientTrait,
    pdbs: &[DisruptionBudget],
    outcome: &mut SyncOutcome,
) {
    for pdb in pdbs {
        match create_pdb(client, pdb).await {
            Ok(true) => outcome.created.push(pdb.name.clone()),
            Ok(false) => {}
            Err(e) => {
                error!("Failed to create PodDisruptionBudget {}: {}", pdb.key(), e);
                outcome
                    .failures
                    .push(format!("create {}: {}", pdb.name, e));
            }
        }
    }
}

/// Applies `plan`: all creates, then all deletes, then same-name replacements
pub async fn apply(
    client: &dyn ClusterClientTrait,
    marker: &OwnershipMarker,
    plan: &Plan,
) -> SyncOutcome {
    let mut outcome = SyncOutcome::default();

    create_all(client, &plan.create, &mut outcome).await;

    for planned in &plan.delete {
        match delete_managed_pdb(client, marker, &plan.namespace, planned).await {
            Ok(true) => outcome.deleted.push(planned.name.clone()),
            Ok(false) => {}
            Err(e) => {
                error!(
                    "Failed to delete PodDisruptionBudget {}/{}: {}",
                    plan.namespace, planned.name, e
                );
                outcome
                    .failures
                    .push(format!("delete {}: {}", planned.name, e));
            }
        }
    }

    create_all(client, &plan.replace, &mut outcome).await;

    outcome
}
