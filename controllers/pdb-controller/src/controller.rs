//! Main controller implementation.
//!
//! The `Controller` runs a full reconciliation pass over every namespace
//! (or the one configured namespace) on a fixed interval until it is told
//! to stop. A pass never aborts on a namespace failure; failures are
//! logged and reported in the [`PassReport`], and the next tick retries.

use crate::config::Settings;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use cluster_client::ClusterClientTrait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Where the loop is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// A namespace whose reconciliation did not complete cleanly
#[derive(Debug)]
pub struct NamespaceFailure {
    pub namespace: String,
    pub error: ControllerError,
}

/// Summary of one reconciliation pass
#[derive(Debug, Default)]
pub struct PassReport {
    pub namespaces: usize,
    pub created: usize,
    pub deleted: usize,
    pub failures: Vec<NamespaceFailure>,
}

/// Periodic PDB controller
pub struct Controller {
    reconciler: Reconciler,
    interval: Duration,
    namespace: Option<String>,
    state: LoopState,
}

impl Controller {
    /// Creates a controller that has not started yet
    pub fn new(client: Arc<dyn ClusterClientTrait>, settings: Settings) -> Self {
        Self {
            reconciler: Reconciler::new(client, settings.reconciler),
            interval: settings.interval,
            namespace: settings.namespace,
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Runs one pass over all namespaces in scope.
    ///
    /// Only fails if the namespace list itself cannot be read.
    pub async fn run_once(&self) -> Result<PassReport, ControllerError> {
        let namespaces = match &self.namespace {
            Some(namespace) => vec![namespace.clone()],
            None => self.reconciler.client().list_namespaces().await?,
        };

        let mut report = PassReport {
            namespaces: namespaces.len(),
            ..PassReport::default()
        };

        for namespace in namespaces {
            let result = self
                .reconciler
                .reconcile_namespace(&namespace)
                .await
                .and_then(|outcome| {
                    report.created += outcome.created;
                    report.deleted += outcome.deleted;
                    outcome.into_result()
                });

            if let Err(e) = result {
                error!("{}", e);
                report.failures.push(NamespaceFailure {
                    namespace,
                    error: e,
                });
            }
        }

        Ok(report)
    }

    /// Runs passes every interval until `stop` turns true or its sender is dropped.
    ///
    /// A stop request never interrupts a pass in flight; the loop exits
    /// once the current pass is done.
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) -> Result<(), ControllerError> {
        let config = self.reconciler.config();
        info!(
            "PDB Controller running (interval: {}, scope: {}, owner label: {}={})",
            humantime::format_duration(self.interval),
            self.namespace.as_deref().unwrap_or("all namespaces"),
            config.marker.key(),
            config.marker.value()
        );
        if let Some(ttl) = config.ttl.default_ttl() {
            info!("Default non-ready TTL: {}", humantime::format_duration(ttl));
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            self.state = LoopState::Idle;
            if *stop.borrow_and_update() {
                break;
            }

            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() {
                        warn!("Stop signal sender dropped, shutting down");
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            self.state = LoopState::Running;
            match self.run_once().await {
                Ok(report) if report.failures.is_empty() => {
                    debug!(
                        "Pass complete: {} namespaces, {} created, {} deleted",
                        report.namespaces, report.created, report.deleted
                    );
                }
                Ok(report) => {
                    warn!(
                        "Pass complete with failures in {} of {} namespaces ({} created, {} deleted)",
                        report.failures.len(),
                        report.namespaces,
                        report.created,
                        report.deleted
                    );
                }
                Err(e) => error!("Reconciliation pass failed: {}", e),
            }
        }

        self.state = LoopState::Stopped;
        info!("PDB Controller stopped");
        Ok(())
    }
}
