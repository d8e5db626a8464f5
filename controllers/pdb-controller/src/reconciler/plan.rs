//! Per-namespace planning.
//!
//! `plan` is a pure function from one namespace's snapshot to the PDBs to
//! create and the managed PDBs to delete. Planned creates count as existing
//! PDBs for later workloads in the same pass, so two workloads sharing a
//! selector end up with a single PDB. A create whose name is held by a
//! managed PDB deleted in the same plan goes to `replace` instead, and is
//! applied after the deletes.

use super::ownership::{partition_ownership, resolve_ownership};
use super::ttl::is_stuck_unready;
use super::ReconcilerConfig;
use crate::labels::{contain_labels, labels_intersect, selector_matches, validate_selector, SelectorProblem};
use chrono::{DateTime, Utc};
use cluster_client::{DisruptionBudget, OwnerReference, PodObservation, Selector, Workload};
use std::fmt;

/// Everything the planner needs to know about one namespace
#[derive(Debug, Clone, Default)]
pub struct NamespaceSnapshot {
    pub namespace: String,
    pub workloads: Vec<Workload>,
    pub pods: Vec<PodObservation>,
    pub pdbs: Vec<DisruptionBudget>,
}

/// Whether a workload should carry a managed PDB, and why not
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Protect,
    InvalidSelector(SelectorProblem),
    /// Pod template labels do not satisfy the selector
    TemplateMismatch,
    SingleReplica,
    UserProtected,
    StuckUnready,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Protect => f.write_str("protected"),
            Verdict::InvalidSelector(problem) => write!(f, "{}", problem),
            Verdict::TemplateMismatch => f.write_str("pod template labels do not match selector"),
            Verdict::SingleReplica => f.write_str("fewer than two replicas"),
            Verdict::UserProtected => f.write_str("covered by a user PDB"),
            Verdict::StuckUnready => f.write_str("all pods unready past the TTL"),
        }
    }
}

/// Why a managed PDB is scheduled for deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteReason {
    /// No workload in the namespace matches its selector
    Orphaned,
    /// Its workloads no longer qualify (replicas, selector shape)
    Ineligible,
    /// A user-owned PDB covers the same workload
    UserProtected,
    /// Every pod of its workload has been unready past the TTL
    StuckUnready,
    EmptySelector,
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DeleteReason::Orphaned => "no matching workload",
            DeleteReason::Ineligible => "workload no longer eligible",
            DeleteReason::UserProtected => "workload covered by a user PDB",
            DeleteReason::StuckUnready => "workload unready past its TTL",
            DeleteReason::EmptySelector => "empty selector",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDelete {
    pub name: String,
    pub reason: DeleteReason,
}

/// A PDB whose selector partly overlaps a workload without matching it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub pdb: String,
    pub workload: String,
}

/// A protectable workload whose PDB name is held by a PDB that stays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameConflict {
    pub pdb: String,
    pub workload: String,
}

/// A workload left without a managed PDB
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub workload: String,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub namespace: String,
    pub create: Vec<DisruptionBudget>,
    pub delete: Vec<PlannedDelete>,
    /// Creates whose name is only freed by a delete in this plan
    pub replace: Vec<DisruptionBudget>,
    pub overlaps: Vec<Overlap>,
    pub conflicts: Vec<NameConflict>,
    pub skipped: Vec<Skipped>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.delete.is_empty() && self.replace.is_empty()
    }
}

/// Pods whose labels satisfy the workload's selector
pub fn pods_of<'a>(
    workload: &'a Workload,
    pods: &'a [PodObservation],
) -> impl Iterator<Item = &'a PodObservation> + 'a {
    pods.iter()
        .filter(move |pod| selector_matches(&workload.selector, &pod.labels))
}

/// Decides whether `workload` should be protected by a managed PDB
pub fn assess(
    workload: &Workload,
    snapshot: &NamespaceSnapshot,
    config: &ReconcilerConfig,
    now: DateTime<Utc>,
) -> Verdict {
    if let Err(problem) = validate_selector(&workload.selector) {
        return Verdict::InvalidSelector(problem);
    }
    if !contain_labels(&workload.template_labels, &workload.selector.match_labels) {
        return Verdict::TemplateMismatch;
    }
    if workload.replicas <= 1 {
        return Verdict::SingleReplica;
    }
    if !partition_ownership(&workload.template_labels, &snapshot.pdbs, &config.marker)
        .user
        .is_empty()
    {
        return Verdict::UserProtected;
    }
    if let Some(ttl) = config.ttl.effective_ttl(workload) {
        if is_stuck_unready(pods_of(workload, &snapshot.pods), ttl, now) {
            return Verdict::StuckUnready;
        }
    }
    Verdict::Protect
}

/// The managed PDB `workload` should have
pub fn desired_pdb(workload: &Workload, config: &ReconcilerConfig) -> DisruptionBudget {
    let mut labels = workload.labels.clone();
    config.marker.stamp(&mut labels);

    let owner_references = workload
        .uid
        .as_ref()
        .map(|uid| {
            vec![OwnerReference {
                api_version: workload.kind.api_version().to_string(),
                kind: workload.kind.as_str().to_string(),
                name: workload.name.clone(),
                uid: uid.clone(),
            }]
        })
        .unwrap_or_default();

    DisruptionBudget {
        namespace: workload.namespace.clone(),
        name: format!("{}-{}", workload.name, config.pdb_name_suffix),
        labels,
        selector: Selector::from_labels(workload.selector.match_labels.clone()),
        min_available: Some(workload.replicas - 1),
        owner_references,
    }
}

fn delete_reason(verdicts: &[Verdict]) -> Option<DeleteReason> {
    if verdicts.is_empty() {
        return Some(DeleteReason::Orphaned);
    }
    if verdicts.contains(&Verdict::Protect) {
        return None;
    }
    if verdicts.contains(&Verdict::UserProtected) {
        return Some(DeleteReason::UserProtected);
    }
    if verdicts.contains(&Verdict::StuckUnready) {
        return Some(DeleteReason::StuckUnready);
    }
    Some(DeleteReason::Ineligible)
}

/// Computes the creates and deletes that bring `snapshot` in line with its workloads
pub fn plan(snapshot: &NamespaceSnapshot, config: &ReconcilerConfig, now: DateTime<Utc>) -> Plan {
    let assessed: Vec<(&Workload, Verdict)> = snapshot
        .workloads
        .iter()
        .map(|workload| (workload, assess(workload, snapshot, config, now)))
        .collect();

    let mut result = Plan {
        namespace: snapshot.namespace.clone(),
        ..Plan::default()
    };

    for pdb in snapshot.pdbs.iter().filter(|pdb| config.marker.owns(pdb)) {
        let reason = if pdb.selector.is_empty() {
            Some(DeleteReason::EmptySelector)
        } else {
            let verdicts: Vec<Verdict> = assessed
                .iter()
                .filter(|(workload, _)| selector_matches(&pdb.selector, &workload.template_labels))
                .map(|(_, verdict)| *verdict)
                .collect();
            delete_reason(&verdicts)
        };

        if let Some(reason) = reason {
            result.delete.push(PlannedDelete {
                name: pdb.name.clone(),
                reason,
            });
        }
    }

    let mut known = snapshot.pdbs.clone();
    for (workload, verdict) in &assessed {
        if *verdict != Verdict::Protect {
            result.skipped.push(Skipped {
                workload: workload.name.clone(),
                verdict: *verdict,
            });
            continue;
        }

        for pdb in &snapshot.pdbs {
            if labels_intersect(&pdb.selector.match_labels, &workload.template_labels)
                && !selector_matches(&pdb.selector, &workload.template_labels)
            {
                result.overlaps.push(Overlap {
                    pdb: pdb.name.clone(),
                    workload: workload.name.clone(),
                });
            }
        }

        if !resolve_ownership(&workload.template_labels, &known, None).is_empty() {
            continue;
        }

        let desired = desired_pdb(workload, config);
        let name_taken = known.iter().any(|pdb| pdb.name == desired.name);
        let freed = result.delete.iter().any(|d| d.name == desired.name)
            && !result.replace.iter().any(|pdb| pdb.name == desired.name);
        if name_taken && !freed {
            result.conflicts.push(NameConflict {
                pdb: desired.name,
                workload: workload.name.clone(),
            });
            continue;
        }
        known.push(desired.clone());
        if name_taken {
            result.replace.push(desired);
        } else {
            result.create.push(desired);
        }
    }

    result
}
