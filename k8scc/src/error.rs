use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::build_id::BuildIdError;
use crate::exchange::ExchangeError;
use crate::k8s::{K8sError, PodPhase};
use crate::metadata::MetadataError;
use crate::platform::PlatformError;
use crate::pod::OwnerError;
use crate::watcher::{CancelReason, WatchError};

/// Errors returned by the launcher procedures.
///
/// None of them is retried by the launcher, the peer re-issues the whole
/// procedure when it wants another attempt.
#[derive(Debug, Error)]
pub enum LauncherError {
    /// Bad invocation arguments or configuration, reported before touching the cluster.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    BuildId(#[from] BuildIdError),

    /// An artifact transfer with the exchange store failed.
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// A create, get or delete call against the cluster failed.
    #[error("cluster api call `{operation}` failed: {source}")]
    ClusterApi {
        operation: &'static str,
        #[source]
        source: K8sError,
    },

    /// The watched pod reached the `Failed` phase.
    #[error("chaincode {chaincode} failed in pod {pod} (phase {phase})")]
    WorkloadFailed {
        pod: String,
        chaincode: String,
        phase: PodPhase,
    },

    /// The watch stopped before the pod reached a terminal phase.
    #[error("watch of pod {pod} was cancelled: {reason}")]
    WatchCancelled { pod: String, reason: CancelReason },

    /// The watch failed for any reason other than cancellation.
    #[error(transparent)]
    Watch(WatchError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Owner(#[from] OwnerError),

    #[error("{context} {path}: {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LauncherError {
    pub(crate) fn cluster(operation: &'static str) -> impl FnOnce(K8sError) -> Self {
        move |source| LauncherError::ClusterApi { operation, source }
    }
}

impl From<WatchError> for LauncherError {
    fn from(err: WatchError) -> Self {
        match err {
            WatchError::Cancelled { pod, reason } => LauncherError::WatchCancelled { pod, reason },
            err => LauncherError::Watch(err),
        }
    }
}
