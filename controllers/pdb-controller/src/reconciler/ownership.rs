//! Ownership resolution between workloads and PDBs.
//!
//! A PDB belongs to a workload when its selector is contained in the
//! workload's pod template labels. Whether the controller may touch the
//! PDB is decided only by the ownership marker label.

use crate::error::ControllerError;
use crate::labels::{contain_labels, selector_matches};
use cluster_client::{DisruptionBudget, Labels};

/// Label pair stamped on every PDB this controller creates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipMarker {
    key: String,
    value: String,
}

impl OwnershipMarker {
    /// Creates a marker; both key and value must be non-empty
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self, ControllerError> {
        let key = key.into();
        let value = value.into();
        if key.trim().is_empty() || value.trim().is_empty() {
            return Err(ControllerError::InvalidConfig(
                "ownership marker label key and value must not be empty".to_string(),
            ));
        }
        Ok(Self { key, value })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The marker as a one-entry label set
    pub fn as_labels(&self) -> Labels {
        Labels::from([(self.key.clone(), self.value.clone())])
    }

    /// True if `labels` carry the marker
    pub fn is_marked(&self, labels: &Labels) -> bool {
        contain_labels(labels, &self.as_labels())
    }

    /// Adds the marker to `labels`, overwriting any existing value for the key
    pub fn stamp(&self, labels: &mut Labels) {
        labels.insert(self.key.clone(), self.value.clone());
    }

    /// True if the PDB is managed by this controller
    pub fn owns(&self, pdb: &DisruptionBudget) -> bool {
        self.is_marked(&pdb.labels)
    }
}

/// Returns the PDBs whose selector is contained in `template_labels`.
///
/// With a marker, only PDBs carrying it are returned; without one, every
/// matching PDB is, managed or not. PDBs with an empty selector never match.
pub fn resolve_ownership<'a>(
    template_labels: &Labels,
    pdbs: &'a [DisruptionBudget],
    marker: Option<&OwnershipMarker>,
) -> Vec<&'a DisruptionBudget> {
    pdbs.iter()
        .filter(|pdb| selector_matches(&pdb.selector, template_labels))
        .filter(|pdb| marker.is_none_or(|m| m.owns(pdb)))
        .collect()
}

/// Matching PDBs of one workload, split by ownership
#[derive(Debug, Default)]
pub struct Ownership<'a> {
    pub managed: Vec<&'a DisruptionBudget>,
    pub user: Vec<&'a DisruptionBudget>,
}

impl Ownership<'_> {
    /// True if any PDB, managed or user, matches
    pub fn is_protected(&self) -> bool {
        !self.managed.is_empty() || !self.user.is_empty()
    }
}

/// Resolves every matching PDB and partitions them by the marker
pub fn partition_ownership<'a>(
    template_labels: &Labels,
    pdbs: &'a [DisruptionBudget],
    marker: &OwnershipMarker,
) -> Ownership<'a> {
    let (managed, user) = resolve_ownership(template_labels, pdbs, None)
        .into_iter()
        .partition(|pdb| marker.owns(pdb));
    Ownership { managed, user }
}
