//! PDB Controller
//!
//! Keeps a PodDisruptionBudget next to every Deployment and StatefulSet
//! with more than one replica:
//! - creates a PDB (`minAvailable: replicas - 1`) for workloads that have none
//! - deletes its own PDBs once their workload is gone or no longer eligible
//! - withdraws protection from workloads whose pods have all been unready
//!   for longer than the configured TTL
//!
//! PDBs created by anyone else are never modified or deleted.

mod config;
mod controller;
mod error;
mod labels;
mod reconciler;
#[cfg(test)]
mod test_utils;

use clap::Parser;
use cluster_client::KubeClusterClient;
use config::Cli;
use controller::Controller;
use crate::error::ControllerError;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    info!("Starting PDB Controller");

    let settings = cli.into_settings()?;

    // kube's rustls backend needs a process-wide provider; ignore a second install
    let _ = rustls::crypto::ring::default_provider().install_default();

    let kube_client = kube::Client::try_default().await?;
    let client = Arc::new(KubeClusterClient::new(kube_client));

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, finishing current pass");
        let _ = stop_tx.send(true);
    });

    let mut controller = Controller::new(client, settings);
    controller.run(stop_rx).await?;

    Ok(())
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves on SIGINT, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
