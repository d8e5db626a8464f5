//! Test utilities for unit testing the reconciler
//!
//! Builders for workloads, pods and PDBs in the `default` namespace.

#![cfg(test)]

use crate::config::DEFAULT_TTL_ANNOTATION;
use crate::reconciler::ownership::OwnershipMarker;
use crate::reconciler::ttl::TtlPolicy;
use crate::reconciler::ReconcilerConfig;
use chrono::{DateTime, TimeDelta, Utc};
use cluster_client::{
    ConditionStatus, DisruptionBudget, Labels, PodObservation, ReadyCondition, Selector, Workload,
    WorkloadKind,
};
use std::time::Duration;

pub const NAMESPACE: &str = "default";

/// Helper to build a label map
pub fn labels(pairs: &[(&str, &str)]) -> Labels {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// The marker used by [`test_config`]
pub fn owner_labels() -> Labels {
    labels(&[("heritage", "pdb-controller")])
}

/// Reconciler config with the default marker, suffix and annotation
pub fn test_config(default_ttl: Option<Duration>) -> ReconcilerConfig {
    ReconcilerConfig {
        marker: OwnershipMarker::new("heritage", "pdb-controller").unwrap(),
        ttl: TtlPolicy::new(default_ttl, DEFAULT_TTL_ANNOTATION),
        pdb_name_suffix: "pdb-controller".to_string(),
    }
}

/// Helper to create a PDB selecting `selector`, carrying the marker if `owned`
pub fn make_pdb(name: &str, selector: &[(&str, &str)], owned: bool) -> DisruptionBudget {
    let pdb_labels = if owned { owner_labels() } else { Labels::new() };
    make_pdb_with_labels(name, selector, pdb_labels)
}

/// Helper to create a PDB with explicit metadata labels
pub fn make_pdb_with_labels(
    name: &str,
    selector: &[(&str, &str)],
    pdb_labels: Labels,
) -> DisruptionBudget {
    DisruptionBudget {
        namespace: NAMESPACE.to_string(),
        name: name.to_string(),
        labels: pdb_labels,
        selector: Selector::from_labels(labels(selector)),
        min_available: Some(1),
        owner_references: vec![],
    }
}

fn make_workload(
    kind: WorkloadKind,
    name: &str,
    selector: &[(&str, &str)],
    replicas: i32,
    non_ready_ttl: &str,
) -> Workload {
    let mut annotations = Labels::new();
    if !non_ready_ttl.is_empty() {
        annotations.insert(DEFAULT_TTL_ANNOTATION.to_string(), non_ready_ttl.to_string());
    }
    Workload {
        namespace: NAMESPACE.to_string(),
        name: name.to_string(),
        kind,
        uid: Some(format!("uid-{}", name)),
        labels: labels(selector),
        annotations,
        selector: Selector::from_labels(labels(selector)),
        replicas,
        template_labels: labels(selector),
    }
}

/// Helper to create a Deployment; an empty `non_ready_ttl` means no annotation
pub fn make_deployment(
    name: &str,
    selector: &[(&str, &str)],
    replicas: i32,
    non_ready_ttl: &str,
) -> Workload {
    make_workload(WorkloadKind::Deployment, name, selector, replicas, non_ready_ttl)
}

/// Helper to create a StatefulSet; an empty `non_ready_ttl` means no annotation
pub fn make_stateful_set(
    name: &str,
    selector: &[(&str, &str)],
    replicas: i32,
    non_ready_ttl: &str,
) -> Workload {
    make_workload(WorkloadKind::StatefulSet, name, selector, replicas, non_ready_ttl)
}

/// Helper to create a pod that turned unready `unready_for` before `now`
pub fn make_pod_at(
    workload_name: &str,
    index: usize,
    pod_labels: &[(&str, &str)],
    now: DateTime<Utc>,
    unready_for: TimeDelta,
) -> PodObservation {
    PodObservation {
        namespace: NAMESPACE.to_string(),
        name: format!("{}-{}", workload_name, index),
        labels: labels(pod_labels),
        ready: Some(ReadyCondition {
            status: ConditionStatus::False,
            last_transition_time: Some(now - unready_for),
        }),
    }
}

/// Helper to create a pod that turned unready `unready_for` ago
pub fn make_unready_pod(
    workload_name: &str,
    index: usize,
    pod_labels: &[(&str, &str)],
    unready_for: TimeDelta,
) -> PodObservation {
    make_pod_at(workload_name, index, pod_labels, Utc::now(), unready_for)
}
