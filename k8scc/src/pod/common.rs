use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, EnvVar, Pod, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use k8scc_config::shared::EnvVarConfig;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::tls::env_var;

/// Name of the volume shared by every container of a workload.
pub const VOLUME_NAME: &str = "chaincode";

/// Mount point of the shared volume in helper containers.
pub const VOLUME_MOUNT_PATH: &str = "/chaincode";

/// Label key marking pods created by the launcher.
pub const ROLE_LABEL: &str = "externalcc-type";

pub(crate) const PULL_IF_NOT_PRESENT: &str = "IfNotPresent";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OwnerError {
    #[error("peer pod has no {0}, cannot reference it as owner")]
    MissingField(&'static str),
}

/// Role of a workload, exposed through the [`ROLE_LABEL`] label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodRole {
    Builder,
    Launcher,
}

impl PodRole {
    pub fn label_value(&self) -> &'static str {
        match self {
            PodRole::Builder => "builder",
            PodRole::Launcher => "launcher",
        }
    }

    pub(crate) fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(ROLE_LABEL.to_owned(), self.label_value().to_owned())])
    }
}

/// Owner reference pointing at the peer pod.
///
/// `block_owner_deletion` makes the garbage collector remove children before
/// the peer pod object itself goes away.
pub fn owner_reference(peer: &Pod) -> Result<OwnerReference, OwnerError> {
    let name = peer
        .metadata
        .name
        .clone()
        .ok_or(OwnerError::MissingField("name"))?;
    let uid = peer
        .metadata
        .uid
        .clone()
        .ok_or(OwnerError::MissingField("uid"))?;

    Ok(OwnerReference {
        api_version: "v1".to_owned(),
        kind: "Pod".to_owned(),
        name,
        uid,
        block_owner_deletion: Some(true),
        ..OwnerReference::default()
    })
}

/// Name of the pod building `build_id` for the peer `peer_pod_name`.
pub fn build_pod_name(peer_pod_name: &str, build_id: &str) -> String {
    format!("{peer_pod_name}-ccbuild-{build_id}")
}

/// Name of the pod running the chaincode `short_name` for the peer `peer_pod_name`.
pub fn run_pod_name(peer_pod_name: &str, short_name: &str) -> String {
    format!("{peer_pod_name}-cc-{short_name}")
}

pub(crate) fn shared_volume() -> Volume {
    Volume {
        name: VOLUME_NAME.to_owned(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Volume::default()
    }
}

pub(crate) fn shared_mount() -> VolumeMount {
    VolumeMount {
        name: VOLUME_NAME.to_owned(),
        mount_path: VOLUME_MOUNT_PATH.to_owned(),
        ..VolumeMount::default()
    }
}

/// Helper container running `script` with bash on the whole shared volume.
pub(crate) fn bash_step(name: &str, image: &str, script: String) -> Container {
    Container {
        name: name.to_owned(),
        image: Some(image.to_owned()),
        command: Some(vec!["/bin/bash".to_owned()]),
        args: Some(vec!["-c".to_owned(), script]),
        volume_mounts: Some(vec![shared_mount()]),
        ..Container::default()
    }
}

pub(crate) fn config_env(entries: &[EnvVarConfig]) -> impl Iterator<Item = EnvVar> + '_ {
    entries
        .iter()
        .map(|entry| env_var(&entry.name, entry.value.clone()))
}
