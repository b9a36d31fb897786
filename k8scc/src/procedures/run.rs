use std::path::PathBuf;
use tracing::{info, instrument};

use crate::build_id::resolve_build_id;
use crate::cleanup::with_pod_cleanup;
use crate::error::LauncherError;
use crate::k8s::{K8sClient, PodPhase};
use crate::metadata::ChaincodeRunConfig;
use crate::pod::{RunPodParams, run_pod, run_pod_name};
use crate::procedures::{Launcher, positional_args};
use crate::resources::merge_resources;

/// Arguments of `run <output_dir> <metadata_dir>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    pub output_dir: PathBuf,
    pub metadata_dir: PathBuf,
}

impl RunArgs {
    pub fn from_args(args: &[String]) -> Result<Self, LauncherError> {
        let [output_dir, metadata_dir] = positional_args("run", args)?;

        Ok(Self {
            output_dir,
            metadata_dir,
        })
    }
}

impl<C> Launcher<C>
where
    C: K8sClient,
{
    /// Starts the chaincode built into `args.output_dir` and serves it until the pod
    /// stops or the launcher is asked to shut down.
    ///
    /// The chaincode pod carries TLS keys, it is deleted whenever this returns.
    #[instrument(name = "run", skip_all, fields(output_dir = %args.output_dir.display()))]
    pub async fn run(&self, args: &RunArgs) -> Result<(), LauncherError> {
        let build_id = resolve_build_id(&args.output_dir)?;
        let run_config = ChaincodeRunConfig::load(
            &args.metadata_dir,
            &args.output_dir,
            self.config.peer_address.as_deref(),
        )?;
        info!(
            chaincode_id = %run_config.chaincode_id,
            short_name = %run_config.short_name,
            platform = %run_config.platform,
            peer_address = %run_config.peer_address,
            tls = run_config.tls.is_enabled(),
            %build_id,
            "running chaincode"
        );

        let pod_name = run_pod_name(&self.peer_pod_name, &run_config.short_name);
        self.replace_stale_pod(&pod_name).await?;

        let owner = self.peer_owner().await?;
        let resources = merge_resources(&self.config.launcher.resources, &run_config.resources);
        let base_url = self.exchange.base_url(&build_id);
        let pod = run_pod(RunPodParams {
            name: pod_name.clone(),
            owner,
            init_image: &self.config.init_image,
            run_config: &run_config,
            env: &self.config.launcher.env,
            resources: &resources,
            base_url: &base_url,
        });

        with_pod_cleanup(&self.client, &pod_name, async {
            self.client
                .create_pod(&pod)
                .await
                .map_err(LauncherError::cluster("create chaincode pod"))?;
            info!(pod = %pod_name, "chaincode pod created");

            let succeeded = self.watcher().watch_until_terminal(&pod_name).await?;
            if !succeeded {
                return Err(LauncherError::WorkloadFailed {
                    pod: pod_name.clone(),
                    chaincode: run_config.chaincode_id.clone(),
                    phase: PodPhase::Failed,
                });
            }

            info!(pod = %pod_name, "chaincode pod completed");
            Ok::<_, LauncherError>(())
        })
        .await
    }
}
