//! The procedures the peer invokes on an external builder.
//!
//! Each procedure takes the positional arguments of its invocation, without
//! the program name. `build` and `run` talk to the cluster, `detect` and
//! `release` only touch the local filesystem.

mod build;
mod detect;
mod release;
mod run;

pub use build::BuildArgs;
pub use detect::{DetectArgs, detect};
pub use release::{ReleaseArgs, release};
pub use run::RunArgs;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use k8scc_config::shared::LauncherConfig;
use std::path::PathBuf;
use tracing::info;

use crate::concurrency::shutdown::ShutdownRx;
use crate::error::LauncherError;
use crate::exchange::ExchangeClient;
use crate::k8s::K8sClient;
use crate::pod::owner_reference;
use crate::watcher::PodWatcher;

/// Runs the procedures against one cluster namespace and one exchange store.
pub struct Launcher<C> {
    config: LauncherConfig,
    client: C,
    exchange: ExchangeClient,
    shutdown_rx: ShutdownRx,
    peer_pod_name: String,
}

impl<C> Launcher<C>
where
    C: K8sClient,
{
    /// Creates a launcher for the peer pod named in `config`.
    pub fn new(
        config: LauncherConfig,
        client: C,
        shutdown_rx: ShutdownRx,
    ) -> Result<Self, LauncherError> {
        let peer_pod_name = config
            .peer_pod_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| LauncherError::Configuration("peer pod name is not set".to_owned()))?;
        let exchange = ExchangeClient::new(&config.file_server_url);

        Ok(Self {
            config,
            client,
            exchange,
            shutdown_rx,
            peer_pod_name,
        })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn watcher(&self) -> PodWatcher<'_, C> {
        PodWatcher::new(&self.client, &self.config.watch, self.shutdown_rx.clone())
    }

    /// Owner reference to the peer pod, making it the parent of the workloads.
    async fn peer_owner(&self) -> Result<OwnerReference, LauncherError> {
        let peer = self
            .client
            .get_pod(&self.peer_pod_name)
            .await
            .map_err(LauncherError::cluster("get peer pod"))?
            .ok_or_else(|| {
                LauncherError::Configuration(format!(
                    "peer pod {} not found in namespace {}",
                    self.peer_pod_name, self.config.namespace
                ))
            })?;

        Ok(owner_reference(&peer)?)
    }

    /// Deletes the pod `name` left by a previous invocation and waits until it is gone.
    async fn replace_stale_pod(&self, name: &str) -> Result<(), LauncherError> {
        let existing = self
            .client
            .get_pod(name)
            .await
            .map_err(LauncherError::cluster("get existing pod"))?;
        if existing.is_none() {
            return Ok(());
        }

        info!(pod = name, "deleting pod left by a previous invocation");
        self.client
            .delete_pod(name)
            .await
            .map_err(LauncherError::cluster("delete existing pod"))?;
        self.watcher().wait_until_deleted(name).await?;

        Ok(())
    }
}

/// Splits `args` into exactly `N` paths.
fn positional_args<const N: usize>(
    procedure: &str,
    args: &[String],
) -> Result<[PathBuf; N], LauncherError> {
    let paths: Vec<PathBuf> = args.iter().map(PathBuf::from).collect();

    paths.try_into().map_err(|_| {
        LauncherError::Configuration(format!(
            "{procedure} requires exactly {N} arguments, got {}",
            args.len()
        ))
    })
}
