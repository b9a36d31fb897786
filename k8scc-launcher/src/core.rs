use k8scc::concurrency::shutdown::{ShutdownTx, create_shutdown_channel};
use k8scc::k8s::http::HttpK8sClient;
use k8scc::procedures::{BuildArgs, DetectArgs, Launcher, ReleaseArgs, RunArgs, detect, release};
use k8scc_config::shared::LauncherConfig;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};

use crate::command::Command;

/// Runs `command` with its positional `args`.
///
/// `detect` and `release` only need the local filesystem. `build` and `run`
/// connect to the cluster and stop waiting on their pod when the process
/// receives SIGTERM or SIGINT.
pub async fn start_launcher_with_config(
    config: Option<LauncherConfig>,
    command: Command,
    args: Vec<String>,
) -> anyhow::Result<()> {
    info!(%command, "starting launcher procedure");

    match command {
        Command::Release => {
            let args = ReleaseArgs::from_args(&args)?;
            release(&args)?;
        }
        Command::Detect => {
            let args = DetectArgs::from_args(&args)?;
            detect(&require_config(config)?, &args)?;
        }
        Command::Build => {
            let args = BuildArgs::from_args(&args)?;
            let config = require_config(config)?;
            let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
            let shutdown_handle = spawn_shutdown_listener(shutdown_tx)?;

            let client = HttpK8sClient::new(&config.namespace).await?;
            let launcher = Launcher::new(config, client, shutdown_rx)?;
            let result = launcher.build(&args).await;

            shutdown_handle.abort();
            result?;
        }
        Command::Run => {
            let args = RunArgs::from_args(&args)?;
            let config = require_config(config)?;
            let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
            let shutdown_handle = spawn_shutdown_listener(shutdown_tx)?;

            let client = HttpK8sClient::new(&config.namespace).await?;
            let launcher = Launcher::new(config, client, shutdown_rx)?;
            let result = launcher.run(&args).await;

            shutdown_handle.abort();
            result?;
        }
    }

    info!(%command, "launcher procedure completed");

    Ok(())
}

fn require_config(config: Option<LauncherConfig>) -> anyhow::Result<LauncherConfig> {
    config.ok_or_else(|| anyhow::anyhow!("launcher configuration is required"))
}

/// Triggers `shutdown_tx` on the first SIGTERM or SIGINT.
///
/// The peer sends SIGTERM to the launcher when it stops the chaincode.
fn spawn_shutdown_listener(
    shutdown_tx: ShutdownTx,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let mut sigterm = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("SIGINT (Ctrl+C) received, stopping launcher");
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, stopping launcher");
            }
        }

        if let Err(e) = shutdown_tx.shutdown() {
            warn!("failed to send shutdown signal: {:?}", e);
        }
    }))
}
