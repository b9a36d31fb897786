use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use std::fmt;
use thiserror::Error;

/// Errors emitted by the Kubernetes integration.
#[derive(Debug, Error)]
pub enum K8sError {
    /// An error returned by the [`kube`] client when talking to the API server.
    #[error("an error occurred with kube when dealing with K8s: {0}")]
    Kube(#[from] kube::Error),
}

impl K8sError {
    /// Returns `true` when retrying the same call later may succeed.
    ///
    /// Throttling, timeouts, server side failures and connection level errors
    /// are transient. Any other answer of the API server is definitive.
    pub fn is_transient(&self) -> bool {
        match self {
            K8sError::Kube(kube::Error::Api(response)) => {
                response.code == 408 || response.code == 429 || response.code >= 500
            }
            K8sError::Kube(kube::Error::HyperError(_) | kube::Error::Service(_)) => true,
            K8sError::Kube(_) => false,
        }
    }

    /// Returns `true` when the API server reported the object as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, K8sError::Kube(kube::Error::Api(response)) if response.code == 404)
    }
}

/// A simplified view of a pod phase.
///
/// Unrecognized values map to [`PodPhase::Unknown`], which is never terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }
}

impl From<&str> for PodPhase {
    fn from(value: &str) -> Self {
        match value {
            "Pending" => PodPhase::Pending,
            "Running" => PodPhase::Running,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        };

        f.write_str(phase)
    }
}

/// Returns the phase reported in the status of `pod`.
///
/// A pod without status has just been accepted and is reported as pending.
pub fn phase_of(pod: &Pod) -> PodPhase {
    pod.status
        .as_ref()
        .and_then(|status| status.phase.as_deref())
        .map(PodPhase::from)
        .unwrap_or(PodPhase::Pending)
}

/// Pod operations the launcher needs, scoped to the configured namespace.
#[async_trait]
pub trait K8sClient: Send + Sync {
    /// Returns the pod named `name`, or `None` if it does not exist.
    async fn get_pod(&self, name: &str) -> Result<Option<Pod>, K8sError>;

    /// Creates `pod` and returns the object stored by the API server.
    async fn create_pod(&self, pod: &Pod) -> Result<Pod, K8sError>;

    /// Deletes the pod named `name`.
    ///
    /// Deleting a pod that does not exist succeeds.
    async fn delete_pod(&self, name: &str) -> Result<(), K8sError>;

    /// Returns the phase of the pod named `name`, or `None` if it does not exist.
    async fn get_pod_phase(&self, name: &str) -> Result<Option<PodPhase>, K8sError> {
        Ok(self.get_pod(name).await?.as_ref().map(phase_of))
    }
}
