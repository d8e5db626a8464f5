//! Command line and environment configuration.
//!
//! Every flag can also be set through an environment variable, so the
//! controller can be configured from a Deployment manifest without args.

use crate::error::ControllerError;
use crate::reconciler::ownership::OwnershipMarker;
use crate::reconciler::ttl::TtlPolicy;
use crate::reconciler::ReconcilerConfig;
use clap::Parser;
use std::time::Duration;

/// Default annotation carrying a per-workload non-ready TTL override
pub const DEFAULT_TTL_ANNOTATION: &str = "pdb-controller.zalando.org/non-ready-ttl";

/// PDB Controller command line
#[derive(Debug, Clone, Parser)]
#[command(name = "pdb-controller", version, about)]
pub struct Cli {
    /// Interval between reconciliation passes
    #[arg(long, env = "PDB_CONTROLLER_INTERVAL", default_value = "1m", value_parser = humantime::parse_duration)]
    pub interval: Duration,

    /// Default TTL after which a workload whose pods are all unready loses its PDB (0s disables)
    #[arg(long, env = "PDB_CONTROLLER_NON_READY_TTL", default_value = "0s", value_parser = humantime::parse_duration)]
    pub non_ready_ttl: Duration,

    /// Workload annotation overriding the non-ready TTL. Values use integer
    /// units such as `90m` or `1h30m`; fractions like `1.5h` are ignored in
    /// favour of the default TTL
    #[arg(long, env = "PDB_CONTROLLER_TTL_ANNOTATION", default_value = DEFAULT_TTL_ANNOTATION)]
    pub ttl_annotation: String,

    /// Suffix appended to the workload name to name its PDB
    #[arg(long, env = "PDB_CONTROLLER_PDB_NAME_SUFFIX", default_value = "pdb-controller")]
    pub pdb_name_suffix: String,

    /// Label key marking PDBs owned by this controller
    #[arg(long, env = "PDB_CONTROLLER_OWNER_LABEL_KEY", default_value = "heritage")]
    pub owner_label_key: String,

    /// Label value marking PDBs owned by this controller
    #[arg(long, env = "PDB_CONTROLLER_OWNER_LABEL_VALUE", default_value = "pdb-controller")]
    pub owner_label_value: String,

    /// Only reconcile this namespace
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub namespace: Option<String>,

    /// Enable debug logging
    #[arg(long, env = "PDB_CONTROLLER_DEBUG")]
    pub debug: bool,
}

/// Validated runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub interval: Duration,
    pub namespace: Option<String>,
    pub reconciler: ReconcilerConfig,
}

impl Cli {
    /// Validates the flags and turns them into [`Settings`]
    pub fn into_settings(self) -> Result<Settings, ControllerError> {
        if self.interval.is_zero() {
            return Err(ControllerError::InvalidConfig(
                "--interval must be greater than zero".to_string(),
            ));
        }
        if self.pdb_name_suffix.trim().is_empty() {
            return Err(ControllerError::InvalidConfig(
                "--pdb-name-suffix must not be empty".to_string(),
            ));
        }
        if self.ttl_annotation.trim().is_empty() {
            return Err(ControllerError::InvalidConfig(
                "--ttl-annotation must not be empty".to_string(),
            ));
        }

        let marker = OwnershipMarker::new(self.owner_label_key, self.owner_label_value)?;
        let default_ttl = (!self.non_ready_ttl.is_zero()).then_some(self.non_ready_ttl);

        Ok(Settings {
            interval: self.interval,
            namespace: self.namespace.filter(|ns| !ns.is_empty()),
            reconciler: ReconcilerConfig {
                marker,
                ttl: TtlPolicy::new(default_ttl, self.ttl_annotation),
                pdb_name_suffix: self.pdb_name_suffix,
            },
        })
    }
}
