use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8scc_config::shared::{EnvVarConfig, ResourcesConfig};

use crate::exchange::{OUTPUT_ARCHIVE_NAME, SOURCE_ARCHIVE_NAME};
use crate::platform::BuildSpec;
use crate::pod::common::{
    PULL_IF_NOT_PRESENT, PodRole, bash_step, config_env, shared_mount, shared_volume,
};
use crate::resources::resource_requirements;
use crate::tls::env_var;

pub const SETUP_VOLUME_STEP: &str = "setup-volume";
pub const DOWNLOAD_SOURCE_STEP: &str = "download-source";
pub const BUILDER_STEP: &str = "builder";
pub const UPLOAD_OUTPUT_STEP: &str = "upload-output";

/// Inputs of [`build_pod`].
pub struct BuildPodParams<'a> {
    pub name: String,
    pub owner: OwnerReference,
    /// Image of the setup, download and upload steps.
    pub init_image: &'a str,
    pub builder_image: &'a str,
    pub build_spec: &'a BuildSpec,
    /// Configuration environment, applied after the platform environment.
    pub env: &'a [EnvVarConfig],
    pub resources: &'a ResourcesConfig,
    /// Exchange store location of this build.
    pub base_url: &'a str,
}

/// Specification of the one-shot pod compiling a chaincode.
///
/// Init steps: `setup-volume`, `download-source`, `builder`. The only main
/// container, `upload-output`, archives `/chaincode/output` and uploads it
/// next to the source archive.
pub fn build_pod(params: BuildPodParams<'_>) -> Pod {
    let setup_volume = bash_step(
        SETUP_VOLUME_STEP,
        params.init_image,
        "mkdir -p /chaincode/input /chaincode/output && chmod 777 /chaincode/input /chaincode/output"
            .to_owned(),
    );

    let download_source = bash_step(
        DOWNLOAD_SOURCE_STEP,
        params.init_image,
        format!(
            "curl -f -s -o- -L '{}/{SOURCE_ARCHIVE_NAME}' | tar -C /chaincode/input -xvf - && chmod -R 777 /chaincode/input",
            params.base_url
        ),
    );

    // Kubernetes applies entries in order, so a configuration entry wins over a platform one.
    let env = params
        .build_spec
        .env
        .iter()
        .map(|(name, value)| env_var(name, value.clone()))
        .chain(config_env(params.env))
        .collect();

    let builder = Container {
        name: BUILDER_STEP.to_owned(),
        image: Some(params.builder_image.to_owned()),
        image_pull_policy: Some(PULL_IF_NOT_PRESENT.to_owned()),
        command: Some(vec!["/bin/sh".to_owned()]),
        args: Some(vec!["-c".to_owned(), params.build_spec.command.clone()]),
        env: Some(env),
        resources: Some(resource_requirements(params.resources)),
        volume_mounts: Some(vec![shared_mount()]),
        ..Container::default()
    };

    let mut upload_output = bash_step(
        UPLOAD_OUTPUT_STEP,
        params.init_image,
        format!(
            r#"
cp -r /chaincode/input/META-INF /chaincode/output/ || echo "META-INF doesn't exist"
cd /chaincode/output &&
tar cvf /chaincode/output.tar $(ls -A) &&
curl -f -X POST -s --upload-file /chaincode/output.tar '{}/{OUTPUT_ARCHIVE_NAME}'"#,
            params.base_url
        ),
    );
    upload_output.image_pull_policy = Some(PULL_IF_NOT_PRESENT.to_owned());

    Pod {
        metadata: ObjectMeta {
            name: Some(params.name),
            owner_references: Some(vec![params.owner]),
            labels: Some(PodRole::Builder.labels()),
            ..ObjectMeta::default()
        },
        spec: Some(PodSpec {
            init_containers: Some(vec![setup_volume, download_source, builder]),
            containers: vec![upload_output],
            enable_service_links: Some(false),
            restart_policy: Some("Never".to_owned()),
            volumes: Some(vec![shared_volume()]),
            ..PodSpec::default()
        }),
        ..Pod::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pod::common::{ROLE_LABEL, VOLUME_NAME};

    fn owner() -> OwnerReference {
        OwnerReference {
            api_version: "v1".to_owned(),
            kind: "Pod".to_owned(),
            name: "peer0".to_owned(),
            uid: "uid-1".to_owned(),
            block_owner_deletion: Some(true),
            ..OwnerReference::default()
        }
    }

    fn pod_with(env: &[EnvVarConfig], resources: &ResourcesConfig) -> Pod {
        let build_spec = BuildSpec {
            command: "make".to_owned(),
            env: vec![("GOPROXY".to_owned(), "https://proxy.golang.org".to_owned())],
        };

        build_pod(BuildPodParams {
            name: "peer0-ccbuild-0123456789".to_owned(),
            owner: owner(),
            init_image: "init:1",
            builder_image: "hyperledger/fabric-ccenv:2.2",
            build_spec: &build_spec,
            env,
            resources,
            base_url: "http://files:8080/0123456789",
        })
    }

    #[test]
    fn build_pod_runs_steps_in_order() {
        let pod = pod_with(&[], &ResourcesConfig::default());
        let spec = pod.spec.unwrap();

        let init_names: Vec<_> = spec
            .init_containers
            .unwrap()
            .into_iter()
            .map(|container| container.name)
            .collect();
        assert_eq!(init_names, [SETUP_VOLUME_STEP, DOWNLOAD_SOURCE_STEP, BUILDER_STEP]);
        assert_eq!(spec.containers.len(), 1);
        assert_eq!(spec.containers[0].name, UPLOAD_OUTPUT_STEP);
        assert_eq!(spec.restart_policy.as_deref(), Some("Never"));
        assert_eq!(spec.enable_service_links, Some(false));
        assert_eq!(spec.volumes.unwrap()[0].name, VOLUME_NAME);
    }

    #[test]
    fn build_pod_is_labelled_and_owned() {
        let pod = pod_with(&[], &ResourcesConfig::default());

        assert_eq!(
            pod.metadata.name.as_deref(),
            Some("peer0-ccbuild-0123456789")
        );
        assert_eq!(
            pod.metadata.labels.unwrap().get(ROLE_LABEL).map(String::as_str),
            Some("builder")
        );
        assert_eq!(pod.metadata.owner_references.unwrap(), vec![owner()]);
    }

    #[test]
    fn build_pod_exchanges_archives_with_build_location() {
        let pod = pod_with(&[], &ResourcesConfig::default());
        let spec = pod.spec.unwrap();
        let init = spec.init_containers.unwrap();

        let download = &init[1].args.as_ref().unwrap()[1];
        assert!(download.contains("'http://files:8080/0123456789/chaincode-source.tar'"));

        let upload = &spec.containers[0].args.as_ref().unwrap()[1];
        assert!(upload.contains("--upload-file /chaincode/output.tar"));
        assert!(upload.contains("'http://files:8080/0123456789/chaincode-output.tar'"));
        assert!(upload.contains("/chaincode/input/META-INF"));
    }

    #[test]
    fn builder_step_appends_configured_env_after_platform_env() {
        let env = [EnvVarConfig {
            name: "GOPROXY".to_owned(),
            value: "direct".to_owned(),
        }];
        let resources = ResourcesConfig {
            limit_memory: Some("1Gi".to_owned()),
            ..ResourcesConfig::default()
        };
        let pod = pod_with(&env, &resources);
        let init = pod.spec.unwrap().init_containers.unwrap();
        let builder = &init[2];

        assert_eq!(
            builder.image.as_deref(),
            Some("hyperledger/fabric-ccenv:2.2")
        );
        assert_eq!(builder.image_pull_policy.as_deref(), Some("IfNotPresent"));
        assert_eq!(builder.args.as_ref().unwrap()[1], "make");

        let values: Vec<_> = builder
            .env
            .as_ref()
            .unwrap()
            .iter()
            .map(|env| (env.name.as_str(), env.value.as_deref().unwrap()))
            .collect();
        assert_eq!(
            values,
            [
                ("GOPROXY", "https://proxy.golang.org"),
                ("GOPROXY", "direct")
            ]
        );

        let limits = builder
            .resources
            .as_ref()
            .and_then(|resources| resources.limits.as_ref())
            .unwrap();
        assert_eq!(limits.get("memory").map(|q| q.0.as_str()), Some("1Gi"));
    }
}
