//! Cluster client errors

use thiserror::Error;

/// Errors that can occur when talking to the cluster API
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Kubernetes client or API server error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Object with the same name already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Object returned by the API server is missing required fields
    #[error("Invalid object: {0}")]
    InvalidObject(String),

    /// Any other API failure (used by the mock client and for non-kube transports)
    #[error("API error: {0}")]
    Api(String),
}

impl ClusterError {
    /// Classifies a `kube::Error`, splitting out the two benign races.
    ///
    /// `object` describes what was being accessed, e.g. `default/web-pdb-controller`.
    pub fn from_kube(err: kube::Error, object: &str) -> Self {
        match &err {
            kube::Error::Api(response) if response.code == 404 => {
                ClusterError::NotFound(object.to_string())
            }
            kube::Error::Api(response)
                if response.code == 409 && response.reason == "AlreadyExists" =>
            {
                ClusterError::AlreadyExists(object.to_string())
            }
            _ => ClusterError::Kube(err),
        }
    }

    /// True for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound(_))
    }

    /// True for `AlreadyExists`
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClusterError::AlreadyExists(_))
    }
}
