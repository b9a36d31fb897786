use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::archive::compress_dir;
use crate::build_id::resolve_build_id;
use crate::cleanup::delete_pod_silently;
use crate::error::LauncherError;
use crate::fs::copy_dir_all;
use crate::k8s::{K8sClient, PodPhase};
use crate::metadata::{BuildInformation, ChaincodeMetadata};
use crate::pod::{BuildPodParams, build_pod, build_pod_name};
use crate::procedures::{Launcher, positional_args};

const META_INF_DIR: &str = "META-INF";

/// Arguments of `build <source_dir> <metadata_dir> <output_dir>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArgs {
    pub source_dir: PathBuf,
    pub metadata_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl BuildArgs {
    pub fn from_args(args: &[String]) -> Result<Self, LauncherError> {
        let [source_dir, metadata_dir, output_dir] = positional_args("build", args)?;

        Ok(Self {
            source_dir,
            metadata_dir,
            output_dir,
        })
    }
}

impl<C> Launcher<C>
where
    C: K8sClient,
{
    /// Compiles the chaincode in `args.source_dir` inside a build pod.
    ///
    /// On success the build pod is deleted and `args.output_dir` receives the
    /// build information read back by `run`. On failure the pod is left in
    /// place for inspection.
    #[instrument(name = "build", skip_all, fields(source_dir = %args.source_dir.display()))]
    pub async fn build(&self, args: &BuildArgs) -> Result<(), LauncherError> {
        let metadata = ChaincodeMetadata::read(&args.metadata_dir)?;
        let platform = metadata.platform()?;
        let image = self
            .config
            .builder_image(&metadata.chaincode_type)
            .ok_or_else(|| {
                LauncherError::Configuration(format!(
                    "no builder image configured for chaincode type {}",
                    metadata.chaincode_type
                ))
            })?;

        let build_id = resolve_build_id(&args.source_dir)?;
        info!(
            label = %metadata.label,
            chaincode_type = %metadata.chaincode_type,
            chaincode_id = ?metadata.id,
            %build_id,
            image,
            "building chaincode"
        );

        let archive = compress_dir(&args.source_dir)?;
        let base_url = self.exchange.base_url(&build_id);
        self.exchange.upload(&base_url, archive).await?;

        let pod_name = build_pod_name(&self.peer_pod_name, build_id.as_str());
        let owner = self.peer_owner().await?;
        self.replace_stale_pod(&pod_name).await?;

        let build_spec = platform.build_spec(&metadata.path);
        let pod = build_pod(BuildPodParams {
            name: pod_name.clone(),
            owner,
            init_image: &self.config.init_image,
            builder_image: image,
            build_spec: &build_spec,
            env: &self.config.builder.env,
            resources: &self.config.builder.resources,
            base_url: &base_url,
        });
        self.client
            .create_pod(&pod)
            .await
            .map_err(LauncherError::cluster("create build pod"))?;
        info!(pod = %pod_name, "build pod created");

        let succeeded = self.watcher().watch_until_terminal(&pod_name).await?;
        if !succeeded {
            return Err(LauncherError::WorkloadFailed {
                pod: pod_name,
                chaincode: metadata.label,
                phase: PodPhase::Failed,
            });
        }

        copy_meta_inf(&args.source_dir, &args.output_dir)?;
        BuildInformation {
            image: image.to_owned(),
            platform: platform.to_string(),
        }
        .write(&args.output_dir)?;
        info!(pod = %pod_name, "chaincode built");

        delete_pod_silently(&self.client, &pod_name).await;

        Ok(())
    }
}

/// Copies the `META-INF` directory of the source package into the output, when present.
fn copy_meta_inf(source_dir: &Path, output_dir: &Path) -> Result<(), LauncherError> {
    let meta_inf = source_dir.join(META_INF_DIR);
    if !meta_inf.is_dir() {
        return Ok(());
    }

    let target = output_dir.join(META_INF_DIR);
    copy_dir_all(&meta_inf, &target).map_err(|source| LauncherError::Io {
        context: "failed to copy META-INF into",
        path: target,
        source,
    })
}
