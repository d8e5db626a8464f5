//! Conversion between `k8s-openapi` objects and the domain models

use crate::error::ClusterError;
use crate::models::*;
use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::api::policy::v1::{PodDisruptionBudget, PodDisruptionBudgetSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

const READY_CONDITION: &str = "Ready";

/// Reduces a `LabelSelector` to its `matchLabels`, remembering whether it had expressions
pub fn selector_from(selector: Option<&metav1::LabelSelector>) -> Selector {
    match selector {
        Some(selector) => Selector {
            match_labels: selector.match_labels.clone().unwrap_or_default(),
            has_expressions: selector
                .match_expressions
                .as_ref()
                .is_some_and(|expressions| !expressions.is_empty()),
        },
        None => Selector::default(),
    }
}

/// Converts an API timestamp to UTC.
///
/// Goes through the serialized RFC 3339 form so it does not depend on which
/// date-time library backs `Time` in the selected `k8s-openapi` release.
pub fn time_to_utc(time: &metav1::Time) -> Option<DateTime<Utc>> {
    let value = serde_json::to_value(time).ok()?;
    DateTime::parse_from_rfc3339(value.as_str()?)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn required_name(meta: &metav1::ObjectMeta, kind: &str) -> Result<String, ClusterError> {
    meta.name
        .clone()
        .ok_or_else(|| ClusterError::InvalidObject(format!("{} without metadata.name", kind)))
}

fn template_labels(template: &k8s_openapi::api::core::v1::PodTemplateSpec) -> Labels {
    template
        .metadata
        .as_ref()
        .and_then(|meta| meta.labels.clone())
        .unwrap_or_default()
}

/// Builds a [`Workload`] from a Deployment
pub fn workload_from_deployment(deployment: &Deployment) -> Result<Workload, ClusterError> {
    let meta = &deployment.metadata;
    let name = required_name(meta, "Deployment")?;
    let spec = deployment.spec.as_ref().ok_or_else(|| {
        ClusterError::InvalidObject(format!("Deployment {} has no spec", name))
    })?;

    Ok(Workload {
        namespace: meta.namespace.clone().unwrap_or_default(),
        name,
        kind: WorkloadKind::Deployment,
        uid: meta.uid.clone(),
        labels: meta.labels.clone().unwrap_or_default(),
        annotations: meta.annotations.clone().unwrap_or_default(),
        selector: selector_from(Some(&spec.selector)),
        replicas: spec.replicas.unwrap_or(1),
        template_labels: template_labels(&spec.template),
    })
}

/// Builds a [`Workload`] from a StatefulSet
pub fn workload_from_stateful_set(stateful_set: &StatefulSet) -> Result<Workload, ClusterError> {
    let meta = &stateful_set.metadata;
    let name = required_name(meta, "StatefulSet")?;
    let spec = stateful_set.spec.as_ref().ok_or_else(|| {
        ClusterError::InvalidObject(format!("StatefulSet {} has no spec", name))
    })?;

    Ok(Workload {
        namespace: meta.namespace.clone().unwrap_or_default(),
        name,
        kind: WorkloadKind::StatefulSet,
        uid: meta.uid.clone(),
        labels: meta.labels.clone().unwrap_or_default(),
        annotations: meta.annotations.clone().unwrap_or_default(),
        selector: selector_from(Some(&spec.selector)),
        replicas: spec.replicas.unwrap_or(1),
        template_labels: template_labels(&spec.template),
    })
}

/// Builds a [`PodObservation`] from a Pod, keeping only its `Ready` condition
pub fn pod_observation(pod: &Pod) -> Result<PodObservation, ClusterError> {
    let meta = &pod.metadata;
    let name = required_name(meta, "Pod")?;

    let ready = pod
        .status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .and_then(|conditions| {
            conditions
                .iter()
                .find(|condition| condition.type_ == READY_CONDITION)
        })
        .map(|condition| ReadyCondition {
            status: ConditionStatus::parse(&condition.status),
            last_transition_time: condition.last_transition_time.as_ref().and_then(time_to_utc),
        });

    Ok(PodObservation {
        namespace: meta.namespace.clone().unwrap_or_default(),
        name,
        labels: meta.labels.clone().unwrap_or_default(),
        ready,
    })
}

/// Builds a [`DisruptionBudget`] from a PodDisruptionBudget
pub fn disruption_budget(pdb: &PodDisruptionBudget) -> Result<DisruptionBudget, ClusterError> {
    let meta = &pdb.metadata;
    let name = required_name(meta, "PodDisruptionBudget")?;
    let spec = pdb.spec.as_ref();

    let min_available = spec
        .and_then(|spec| spec.min_available.as_ref())
        .and_then(|value| match value {
            IntOrString::Int(n) => Some(*n),
            IntOrString::String(_) => None,
        });

    let owner_references = meta
        .owner_references
        .as_ref()
        .map(|refs| {
            refs.iter()
                .map(|r| OwnerReference {
                    api_version: r.api_version.clone(),
                    kind: r.kind.clone(),
                    name: r.name.clone(),
                    uid: r.uid.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(DisruptionBudget {
        namespace: meta.namespace.clone().unwrap_or_default(),
        name,
        labels: meta.labels.clone().unwrap_or_default(),
        selector: selector_from(spec.and_then(|spec| spec.selector.as_ref())),
        min_available,
        owner_references,
    })
}

/// Builds the PodDisruptionBudget object to submit for a [`DisruptionBudget`]
pub fn to_pod_disruption_budget(pdb: &DisruptionBudget) -> PodDisruptionBudget {
    let owner_references = if pdb.owner_references.is_empty() {
        None
    } else {
        Some(
            pdb.owner_references
                .iter()
                .map(|r| metav1::OwnerReference {
                    api_version: r.api_version.clone(),
                    kind: r.kind.clone(),
                    name: r.name.clone(),
                    uid: r.uid.clone(),
                    ..Default::default()
                })
                .collect(),
        )
    };

    PodDisruptionBudget {
        metadata: metav1::ObjectMeta {
            name: Some(pdb.name.clone()),
            namespace: Some(pdb.namespace.clone()),
            labels: Some(pdb.labels.clone()),
            owner_references,
            ..Default::default()
        },
        spec: Some(PodDisruptionBudgetSpec {
            min_available: pdb.min_available.map(IntOrString::Int),
            selector: Some(metav1::LabelSelector {
                match_labels: Some(pdb.selector.match_labels.clone()),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
