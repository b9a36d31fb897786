use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, VolumeMount};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8scc_config::shared::{EnvVarConfig, ResourcesConfig};

use crate::exchange::OUTPUT_ARCHIVE_NAME;
use crate::metadata::ChaincodeRunConfig;
use crate::pod::common::{
    PULL_IF_NOT_PRESENT, PodRole, VOLUME_NAME, bash_step, config_env, shared_volume,
};
use crate::resources::resource_requirements;
use crate::tls::{ARTIFACTS_DIR, env_var};

pub const DOWNLOAD_OUTPUT_STEP: &str = "download-output";
pub const POPULATE_ARTIFACTS_STEP: &str = "populate-artifacts";
pub const CHAINCODE_CONTAINER: &str = "chaincode";

/// Inputs of [`run_pod`].
pub struct RunPodParams<'a> {
    pub name: String,
    pub owner: OwnerReference,
    pub init_image: &'a str,
    pub run_config: &'a ChaincodeRunConfig,
    /// Configuration environment, applied after the chaincode environment.
    pub env: &'a [EnvVarConfig],
    /// Resources after merging the chaincode overrides.
    pub resources: &'a ResourcesConfig,
    /// Exchange store location of the build being started.
    pub base_url: &'a str,
}

/// Specification of the long-running pod serving a chaincode.
pub fn run_pod(params: RunPodParams<'_>) -> Pod {
    let run_config = params.run_config;
    let run_spec = run_config.platform.run_spec(&run_config.peer_address);

    let download_output = bash_step(
        DOWNLOAD_OUTPUT_STEP,
        params.init_image,
        format!(
            "mkdir -p /chaincode/output && chmod -R 777 /chaincode/output && curl -f -s -o- -L '{}/{OUTPUT_ARCHIVE_NAME}' | tar -C /chaincode/output -xvf -",
            params.base_url
        ),
    );

    let populate_artifacts = bash_step(
        POPULATE_ARTIFACTS_STEP,
        params.init_image,
        run_config.tls.populate_script(),
    );

    let env = [
        env_var("CORE_CHAINCODE_ID_NAME", run_config.chaincode_id.as_str()),
        env_var("CORE_CHAINCODE_ID", run_config.chaincode_id.as_str()),
        env_var("CORE_PEER_LOCALMSPID", run_config.mspid.as_str()),
    ]
    .into_iter()
    .chain(run_config.tls.env())
    .chain(config_env(params.env))
    .collect();

    let chaincode = Container {
        name: CHAINCODE_CONTAINER.to_owned(),
        image: Some(run_config.image.clone()),
        image_pull_policy: Some(PULL_IF_NOT_PRESENT.to_owned()),
        working_dir: Some(run_spec.mount_dir.to_owned()),
        command: Some(run_spec.command),
        env: Some(env),
        resources: Some(resource_requirements(params.resources)),
        volume_mounts: Some(vec![
            sub_path_mount("artifacts", ARTIFACTS_DIR),
            sub_path_mount("output", run_spec.mount_dir),
        ]),
        ..Container::default()
    };

    Pod {
        metadata: ObjectMeta {
            name: Some(params.name),
            owner_references: Some(vec![params.owner]),
            labels: Some(PodRole::Launcher.labels()),
            ..ObjectMeta::default()
        },
        spec: Some(PodSpec {
            init_containers: Some(vec![download_output, populate_artifacts]),
            containers: vec![chaincode],
            enable_service_links: Some(false),
            restart_policy: Some("Always".to_owned()),
            volumes: Some(vec![shared_volume()]),
            ..PodSpec::default()
        }),
        ..Pod::default()
    }
}

fn sub_path_mount(sub_path: &str, mount_path: &str) -> VolumeMount {
    VolumeMount {
        name: VOLUME_NAME.to_owned(),
        mount_path: mount_path.to_owned(),
        sub_path: Some(sub_path.to_owned()),
        ..VolumeMount::default()
    }
}
