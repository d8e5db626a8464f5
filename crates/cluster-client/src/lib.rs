//! Cluster Client
//!
//! The capability layer the PDB controller uses to observe and mutate a
//! Kubernetes cluster. The controller never touches `kube::Api` directly;
//! it sees namespaces, workloads, pods and PodDisruptionBudgets through
//! [`ClusterClientTrait`] and the plain domain models in [`models`].
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{ClusterClientTrait, KubeClusterClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeClusterClient::new(kube::Client::try_default().await?);
//!
//! for namespace in client.list_namespaces().await? {
//!     let pdbs = client.list_pdbs(&namespace).await?;
//!     println!("{}: {} PodDisruptionBudgets", namespace, pdbs.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Domain models**: workloads, pod readiness observations and PDBs,
//!   independent of the `k8s-openapi` schema version
//! - **Race-aware errors**: `NotFound` and `AlreadyExists` are surfaced as
//!   their own variants so callers can treat them as benign
//! - **Mocking**: `MockClusterClient` behind the `test-util` feature

pub mod client;
pub mod convert;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod cluster_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeClusterClient;
pub use cluster_trait::ClusterClientTrait;
pub use error::ClusterError;
pub use models::*;
#[cfg(feature = "test-util")]
pub use mock::MockClusterClient;
