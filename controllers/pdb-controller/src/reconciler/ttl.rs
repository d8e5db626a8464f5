//! Non-ready TTL evaluation.
//!
//! A workload is stuck unready when it has pods and every one of them has
//! been unready for at least the effective TTL. The check is a reduction:
//! the minimum per-pod unready duration is compared against the TTL, with
//! ready pods counting as zero.

use chrono::{DateTime, TimeDelta, Utc};
use cluster_client::{ConditionStatus, PodObservation, Workload};
use std::time::Duration;
use tracing::warn;

/// Default TTL plus the annotation that can override it per workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlPolicy {
    default_ttl: Option<Duration>,
    annotation: String,
}

impl TtlPolicy {
    /// `default_ttl` of `None` disables the override unless a workload sets the annotation
    pub fn new(default_ttl: Option<Duration>, annotation: impl Into<String>) -> Self {
        Self {
            default_ttl: default_ttl.filter(|ttl| !ttl.is_zero()),
            annotation: annotation.into(),
        }
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    /// Cheap pre-check: true if `workload` could have a TTL at all
    pub fn may_apply(&self, workload: &Workload) -> bool {
        self.default_ttl.is_some() || workload.annotations.contains_key(&self.annotation)
    }

    /// TTL that governs `workload`, `None` when the override is disabled for it.
    ///
    /// A valid annotation wins over the default. An unparsable one, including
    /// fractional values such as `1.5h`, is logged and ignored. A zero TTL
    /// from either source disables the check.
    pub fn effective_ttl(&self, workload: &Workload) -> Option<Duration> {
        let ttl = match workload.annotations.get(&self.annotation) {
            Some(raw) => match humantime::parse_duration(raw.trim()) {
                Ok(ttl) => Some(ttl),
                Err(e) => {
                    warn!(
                        "Ignoring invalid {} annotation {:?} on {} {}: {}",
                        self.annotation,
                        raw,
                        workload.kind,
                        workload.key(),
                        e
                    );
                    self.default_ttl
                }
            },
            None => self.default_ttl,
        };
        ttl.filter(|ttl| !ttl.is_zero())
    }
}

/// How long `pod` has been continuously unready at `now`.
///
/// Zero unless the most recent Ready condition is `False` with a known
/// transition time. Transition times in the future clamp to zero.
pub fn unready_duration(pod: &PodObservation, now: DateTime<Utc>) -> TimeDelta {
    match &pod.ready {
        Some(condition) if condition.status == ConditionStatus::False => condition
            .last_transition_time
            .map(|since| (now - since).max(TimeDelta::zero()))
            .unwrap_or_else(TimeDelta::zero),
        _ => TimeDelta::zero(),
    }
}

/// Minimum unready duration across `pods`, `None` for an empty set
pub fn min_unready_duration<'a>(
    pods: impl IntoIterator<Item = &'a PodObservation>,
    now: DateTime<Utc>,
) -> Option<TimeDelta> {
    pods.into_iter().map(|pod| unready_duration(pod, now)).min()
}

/// True iff `pods` is non-empty and every pod has been unready for at least `ttl`
pub fn is_stuck_unready<'a>(
    pods: impl IntoIterator<Item = &'a PodObservation>,
    ttl: Duration,
    now: DateTime<Utc>,
) -> bool {
    let Ok(threshold) = TimeDelta::from_std(ttl) else {
        // Beyond chrono's range, no pod can have been unready that long
        return false;
    };
    min_unready_duration(pods, now).is_some_and(|min| min >= threshold)
}
