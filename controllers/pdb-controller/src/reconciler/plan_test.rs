//! Unit tests for the planner

use super::plan::*;
use crate::labels::SelectorProblem;
use crate::test_utils::*;
use chrono::{TimeDelta, Utc};
use cluster_client::{DisruptionBudget, PodObservation, Selector, Workload};
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

fn snapshot(
    workloads: Vec<Workload>,
    pods: Vec<PodObservation>,
    pdbs: Vec<DisruptionBudget>,
) -> NamespaceSnapshot {
    NamespaceSnapshot {
        namespace: NAMESPACE.to_string(),
        workloads,
        pods,
        pdbs,
    }
}

fn created_names(plan: &Plan) -> Vec<&str> {
    plan.create.iter().map(|pdb| pdb.name.as_str()).collect()
}

fn deleted(plan: &Plan) -> Vec<(&str, DeleteReason)> {
    plan.delete
        .iter()
        .map(|d| (d.name.as_str(), d.reason))
        .collect()
}

/// Applies a plan to a snapshot the way a fully successful sync would
fn apply(mut snap: NamespaceSnapshot, plan: &Plan) -> NamespaceSnapshot {
    snap.pdbs.retain(|pdb| !plan.delete.iter().any(|d| d.name == pdb.name));
    snap.pdbs.extend(plan.create.iter().cloned());
    snap.pdbs.extend(plan.replace.iter().cloned());
    snap
}

#[test]
fn test_ttl_overrides_and_min_across_pods() {
    let now = Utc::now();
    let config = test_config(Some(HOUR));

    let unready = |workload: &str, minutes: &[i64]| -> Vec<PodObservation> {
        minutes
            .iter()
            .enumerate()
            .map(|(i, m)| make_pod_at(workload, i, &[("app", workload)], now, TimeDelta::minutes(*m)))
            .collect()
    };

    let workloads = vec![
        make_deployment("d1", &[("app", "d1")], 3, "5s"),
        make_deployment("d2", &[("app", "d2")], 3, "15m"),
        make_deployment("d3", &[("app", "d3")], 3, ""),
        make_deployment("d4", &[("app", "d4")], 3, ""),
    ];
    let pods = [
        unready("d1", &[1, 2, 3]),
        unready("d2", &[5, 6, 7]),
        unready("d3", &[60, 61, 62]),
        unready("d4", &[59, 60, 61]),
    ]
    .concat();
    let pdbs = vec![
        make_pdb("pdb-1", &[("app", "d1")], true),
        make_pdb("pdb-2", &[("app", "d2")], true),
        make_pdb("pdb-3", &[("app", "d3")], true),
        make_pdb("pdb-4", &[("app", "d4")], true),
    ];

    let plan = plan(&snapshot(workloads, pods, pdbs), &config, now);

    assert!(plan.create.is_empty());
    assert_eq!(
        deleted(&plan),
        vec![
            ("pdb-1", DeleteReason::StuckUnready),
            ("pdb-3", DeleteReason::StuckUnready),
        ]
    );
}

#[test]
fn test_eligible_workload_gets_exactly_one_pdb() {
    let config = test_config(None);
    let snap = snapshot(
        vec![make_deployment("web", &[("app", "web")], 3, "")],
        vec![],
        vec![],
    );

    let plan = plan(&snap, &config, Utc::now());

    assert_eq!(created_names(&plan), vec!["web-pdb-controller"]);
    let pdb = &plan.create[0];
    assert_eq!(pdb.namespace, NAMESPACE);
    assert_eq!(pdb.min_available, Some(2));
    assert_eq!(pdb.selector, Selector::from_labels(labels(&[("app", "web")])));
    assert!(config.marker.owns(pdb));
    assert_eq!(pdb.labels.get("app").map(String::as_str), Some("web"));
    assert_eq!(pdb.owner_references.len(), 1);
    assert_eq!(pdb.owner_references[0].kind, "Deployment");
    assert_eq!(pdb.owner_references[0].api_version, "apps/v1");
    assert_eq!(pdb.owner_references[0].uid, "uid-web");
}

#[test]
fn test_stateful_sets_are_protected_too() {
    let config = test_config(None);
    let snap = snapshot(
        vec![make_stateful_set("db", &[("app", "db")], 3, "")],
        vec![],
        vec![],
    );

    let plan = plan(&snap, &config, Utc::now());

    assert_eq!(created_names(&plan), vec!["db-pdb-controller"]);
    assert_eq!(plan.create[0].owner_references[0].kind, "StatefulSet");
}

#[test]
fn test_orphaned_managed_pdb_is_removed() {
    let config = test_config(None);
    let snap = snapshot(
        vec![make_deployment("web", &[("app", "web")], 3, "")],
        vec![],
        vec![
            make_pdb("web-pdb-controller", &[("app", "web")], true),
            make_pdb("gone-pdb-controller", &[("app", "gone")], true),
        ],
    );

    let plan = plan(&snap, &config, Utc::now());

    assert!(plan.create.is_empty());
    assert_eq!(
        deleted(&plan),
        vec![("gone-pdb-controller", DeleteReason::Orphaned)]
    );
}

#[test]
fn test_user_pdbs_are_never_deleted_and_block_creation() {
    let config = test_config(None);
    let snap = snapshot(
        vec![
            make_deployment("web", &[("app", "web")], 3, ""),
            make_deployment("api", &[("app", "api")], 1, ""),
        ],
        vec![],
        vec![
            make_pdb("web-user", &[("app", "web")], false),
            make_pdb("nothing-matches", &[("app", "gone")], false),
            make_pdb("api-user", &[("app", "api")], false),
        ],
    );

    let plan = plan(&snap, &config, Utc::now());

    assert!(plan.is_empty());
}

#[test]
fn test_managed_pdb_yields_to_user_pdb() {
    let config = test_config(None);
    let snap = snapshot(
        vec![make_deployment("web", &[("app", "web")], 3, "")],
        vec![],
        vec![
            make_pdb("web-pdb-controller", &[("app", "web")], true),
            make_pdb("web-user", &[("app", "web")], false),
        ],
    );

    let plan = plan(&snap, &config, Utc::now());

    assert!(plan.create.is_empty());
    assert_eq!(
        deleted(&plan),
        vec![("web-pdb-controller", DeleteReason::UserProtected)]
    );
}

#[test]
fn test_shared_selector_gets_a_single_pdb() {
    let config = test_config(None);
    let snap = snapshot(
        vec![
            make_deployment("web", &[("app", "web")], 3, ""),
            make_stateful_set("web-cache", &[("app", "web")], 2, ""),
        ],
        vec![],
        vec![],
    );

    let plan = plan(&snap, &config, Utc::now());

    assert_eq!(created_names(&plan), vec!["web-pdb-controller"]);
}

#[test]
fn test_plan_is_idempotent() {
    let config = test_config(Some(HOUR));
    let now = Utc::now();
    let snap = snapshot(
        vec![
            make_deployment("web", &[("app", "web")], 3, ""),
            make_deployment("single", &[("app", "single")], 1, ""),
        ],
        vec![make_pod_at("web", 0, &[("app", "web")], now, TimeDelta::minutes(1))],
        vec![make_pdb("gone-pdb-controller", &[("app", "gone")], true)],
    );

    let first = plan(&snap, &config, now);
    assert_eq!(created_names(&first), vec!["web-pdb-controller"]);
    assert_eq!(first.delete.len(), 1);

    let second = plan(&apply(snap, &first), &config, now);
    assert!(second.is_empty(), "second pass should be a no-op: {:?}", second);
}

#[test]
fn test_single_replica_workloads_are_ineligible() {
    let config = test_config(None);
    let snap = snapshot(
        vec![
            make_deployment("one", &[("app", "one")], 1, ""),
            make_deployment("zero", &[("app", "zero")], 0, ""),
        ],
        vec![],
        vec![make_pdb("one-pdb-controller", &[("app", "one")], true)],
    );

    let plan = plan(&snap, &config, Utc::now());

    assert!(plan.create.is_empty());
    assert_eq!(
        deleted(&plan),
        vec![("one-pdb-controller", DeleteReason::Ineligible)]
    );
}

#[test]
fn test_invalid_selectors_are_skipped() {
    let config = test_config(None);
    let now = Utc::now();

    let mut empty = make_deployment("empty", &[], 3, "");
    empty.template_labels = labels(&[("app", "empty")]);
    let mut expressions = make_deployment("expr", &[("app", "expr")], 3, "");
    expressions.selector.has_expressions = true;
    let mut mismatch = make_deployment("mismatch", &[("app", "mismatch")], 3, "");
    mismatch.template_labels = labels(&[("app", "other")]);

    let snap = snapshot(vec![empty, expressions, mismatch], vec![], vec![]);

    assert_eq!(
        assess(&snap.workloads[0], &snap, &config, now),
        Verdict::InvalidSelector(SelectorProblem::Empty)
    );
    assert_eq!(
        assess(&snap.workloads[1], &snap, &config, now),
        Verdict::InvalidSelector(SelectorProblem::Expressions)
    );
    assert_eq!(
        assess(&snap.workloads[2], &snap, &config, now),
        Verdict::TemplateMismatch
    );
    assert!(plan(&snap, &config, now).is_empty());
}

#[test]
fn test_managed_pdb_with_empty_selector_is_removed() {
    let config = test_config(None);
    let snap = snapshot(
        vec![make_deployment("web", &[("app", "web")], 3, "")],
        vec![],
        vec![
            make_pdb("web-pdb-controller", &[("app", "web")], true),
            make_pdb("catch-all", &[], true),
        ],
    );

    let plan = plan(&snap, &config, Utc::now());

    assert_eq!(
        deleted(&plan),
        vec![("catch-all", DeleteReason::EmptySelector)]
    );
}

#[test]
fn test_selector_change_replaces_pdb() {
    let config = test_config(None);
    let mut web = make_deployment("web", &[("app", "web"), ("version", "v2")], 3, "");
    web.name = "web-v2".to_string();
    let snap = snapshot(
        vec![web],
        vec![],
        vec![make_pdb("web-pdb-controller", &[("app", "web"), ("version", "v1")], true)],
    );

    let plan = plan(&snap, &config, Utc::now());

    assert_eq!(created_names(&plan), vec!["web-v2-pdb-controller"]);
    assert_eq!(
        deleted(&plan),
        vec![("web-pdb-controller", DeleteReason::Orphaned)]
    );
}

#[test]
fn test_selector_change_keeping_the_name_replaces_in_one_pass() {
    let config = test_config(None);
    let snap = snapshot(
        vec![make_deployment("web", &[("app", "web"), ("version", "v2")], 3, "")],
        vec![],
        vec![make_pdb("web-pdb-controller", &[("app", "web"), ("version", "v1")], true)],
    );

    let first = plan(&snap, &config, Utc::now());
    assert!(first.create.is_empty());
    assert!(first.conflicts.is_empty());
    assert_eq!(deleted(&first), vec![("web-pdb-controller", DeleteReason::Orphaned)]);
    assert_eq!(first.replace.len(), 1);
    assert_eq!(first.replace[0].name, "web-pdb-controller");
    assert_eq!(
        first.replace[0].selector,
        Selector::from_labels(labels(&[("app", "web"), ("version", "v2")]))
    );

    let after = apply(snap, &first);
    assert_eq!(after.pdbs.len(), 1);
    assert!(plan(&after, &config, Utc::now()).is_empty());
}

#[test]
fn test_name_held_by_user_pdb_is_a_conflict() {
    let config = test_config(None);
    let snap = snapshot(
        vec![make_deployment("web", &[("app", "web")], 3, "")],
        vec![],
        vec![make_pdb("web-pdb-controller", &[("app", "other")], false)],
    );

    let plan = plan(&snap, &config, Utc::now());

    assert!(plan.is_empty());
    assert_eq!(
        plan.conflicts,
        vec![NameConflict {
            pdb: "web-pdb-controller".to_string(),
            workload: "web".to_string(),
        }]
    );
}

#[test]
fn test_stuck_workload_is_not_protected() {
    let now = Utc::now();
    let config = test_config(Some(HOUR));
    let snap = snapshot(
        vec![make_deployment("web", &[("app", "web")], 3, "")],
        vec![
            make_pod_at("web", 0, &[("app", "web")], now, TimeDelta::hours(2)),
            make_pod_at("web", 1, &[("app", "web")], now, TimeDelta::hours(3)),
        ],
        vec![],
    );

    assert_eq!(assess(&snap.workloads[0], &snap, &config, now), Verdict::StuckUnready);
    assert!(plan(&snap, &config, now).is_empty());
}

#[test]
fn test_workload_without_pods_is_not_stuck() {
    let now = Utc::now();
    let config = test_config(Some(Duration::from_secs(1)));
    let snap = snapshot(
        vec![make_deployment("web", &[("app", "web")], 3, "")],
        vec![make_pod_at("api", 0, &[("app", "api")], now, TimeDelta::hours(2))],
        vec![],
    );

    assert_eq!(assess(&snap.workloads[0], &snap, &config, now), Verdict::Protect);
}

#[test]
fn test_partial_overlap_is_reported() {
    let config = test_config(None);
    let snap = snapshot(
        vec![make_deployment("web", &[("app", "web")], 3, "")],
        vec![],
        vec![make_pdb("web-canary", &[("app", "web"), ("track", "canary")], false)],
    );

    let plan = plan(&snap, &config, Utc::now());

    assert_eq!(created_names(&plan), vec!["web-pdb-controller"]);
    assert_eq!(
        plan.overlaps,
        vec![Overlap {
            pdb: "web-canary".to_string(),
            workload: "web".to_string(),
        }]
    );
}
