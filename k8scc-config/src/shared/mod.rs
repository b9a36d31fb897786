mod fileserver;
mod launcher;
mod resources;
mod retry;
mod sentry;
mod watch;

pub use fileserver::*;
pub use launcher::*;
pub use resources::*;
pub use retry::*;
pub use sentry::*;
pub use watch::*;

use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The namespace pods are created in must be set.
    #[error("`namespace` cannot be empty")]
    EmptyNamespace,
    /// The exchange store must be reachable from the launcher and from the pods.
    #[error("`file_server_url` cannot be empty")]
    EmptyFileServerUrl,
    /// The watcher needs a non-zero interval between two status reads.
    #[error("`watch.poll_interval_ms` cannot be zero")]
    PollIntervalZero,
    /// Transient errors must be attempted at least once.
    #[error("`watch.retry.max_attempts` cannot be zero")]
    RetryAttemptsZero,
    /// An environment variable declared for the builder has no name.
    #[error("environment variables declared in `{0}.env` must have a name")]
    UnnamedEnvVar(&'static str),
    /// The legacy listen address is not of the form `[host]:port`.
    #[error("invalid http address {0:?}, expected `[host]:port`")]
    InvalidHttpAddress(String),
}
