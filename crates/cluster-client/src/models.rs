//! Cluster domain models
//!
//! Plain representations of the objects the PDB controller reasons about.
//! They carry only the fields the controller reads, and are built from the
//! `k8s-openapi` schemas in [`crate::convert`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label set or `matchLabels` map. Keys are unique by construction.
pub type Labels = BTreeMap<String, String>;

/// Workload kinds the controller protects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
}

impl WorkloadKind {
    /// API version of the kind, for owner references
    pub fn api_version(&self) -> &'static str {
        "apps/v1"
    }

    /// Kind name as the API server spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "Deployment",
            WorkloadKind::StatefulSet => "StatefulSet",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A label selector reduced to what containment matching can use.
///
/// `matchExpressions` are not evaluated; `has_expressions` records that the
/// selector had some so callers can refuse to reason about it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub match_labels: Labels,
    pub has_expressions: bool,
}

impl Selector {
    /// Selector made of `matchLabels` only
    pub fn from_labels(match_labels: Labels) -> Self {
        Self {
            match_labels,
            has_expressions: false,
        }
    }

    /// True when there are no `matchLabels`, i.e. the selector would match everything
    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty()
    }
}

/// A Deployment or StatefulSet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub namespace: String,
    pub name: String,
    pub kind: WorkloadKind,
    pub uid: Option<String>,
    pub labels: Labels,
    pub annotations: Labels,
    pub selector: Selector,
    /// `spec.replicas`, defaulted to 1 when unset
    pub replicas: i32,
    pub template_labels: Labels,
}

impl Workload {
    /// `namespace/name` for logging
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// Status of a pod condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    /// Parses the API server's `"True"` / `"False"` / anything else
    pub fn parse(value: &str) -> Self {
        match value {
            "True" => ConditionStatus::True,
            "False" => ConditionStatus::False,
            _ => ConditionStatus::Unknown,
        }
    }
}

/// Most recent `Ready` condition of a pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyCondition {
    pub status: ConditionStatus,
    pub last_transition_time: Option<DateTime<Utc>>,
}

/// What the controller observes about a pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodObservation {
    pub namespace: String,
    pub name: String,
    pub labels: Labels,
    pub ready: Option<ReadyCondition>,
}

/// Reference from a PDB to the workload that owns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
}

/// A PodDisruptionBudget, managed or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisruptionBudget {
    pub namespace: String,
    pub name: String,
    pub labels: Labels,
    pub selector: Selector,
    /// Integer `minAvailable`; `None` when unset or given as a percentage
    pub min_available: Option<i32>,
    pub owner_references: Vec<OwnerReference>,
}

impl DisruptionBudget {
    /// `namespace/name` for logging
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}
