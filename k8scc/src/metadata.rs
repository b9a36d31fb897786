//! On-disk documents exchanged with the peer.
//!
//! * `metadata.json` in the metadata directory describes the chaincode package at build time.
//! * `chaincode.json` in the run metadata directory tells how to connect the chaincode back to
//!   the peer.
//! * `k8scc_buildinfo.json` is written into the build output directory and carries the builder
//!   image and platform over to the run phase.

use k8scc_config::shared::ResourcesConfig;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::platform::{Platform, PlatformError};
use crate::tls::TlsArtifacts;

pub const METADATA_FILE: &str = "metadata.json";
pub const RUN_CONFIG_FILE: &str = "chaincode.json";
pub const BUILD_INFO_FILE: &str = "k8scc_buildinfo.json";

/// Number of hash characters kept in a chaincode short name.
pub const SHORT_HASH_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no builder image recorded in {0}")]
    MissingImage(PathBuf),

    #[error("chaincode id {0:?} is not of the form `<name>:<hash>`")]
    MalformedChaincodeId(String),

    #[error("hash of chaincode id {0:?} is shorter than {SHORT_HASH_LEN} characters")]
    ChaincodeHashTooShort(String),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Content of `metadata.json`, as packaged with the chaincode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaincodeMetadata {
    pub label: String,
    #[serde(rename = "type")]
    pub chaincode_type: String,
    #[serde(default)]
    pub path: String,
    /// Optional identifier some packagers add next to the label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ChaincodeMetadata {
    pub fn read(metadata_dir: &Path) -> Result<Self, MetadataError> {
        read_json(&metadata_dir.join(METADATA_FILE))
    }

    pub fn platform(&self) -> Result<Platform, PlatformError> {
        self.chaincode_type.parse()
    }
}

/// Outcome of a build needed to run the chaincode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInformation {
    #[serde(rename = "Image")]
    pub image: String,
    #[serde(rename = "Platform")]
    pub platform: String,
}

impl BuildInformation {
    /// Reads the build information from `output_dir`.
    ///
    /// A record without image is rejected, the chaincode could not be started from it.
    pub fn read(output_dir: &Path) -> Result<Self, MetadataError> {
        let path = output_dir.join(BUILD_INFO_FILE);
        let info: BuildInformation = read_json(&path)?;
        if info.image.is_empty() {
            return Err(MetadataError::MissingImage(path));
        }

        Ok(info)
    }

    /// Writes the build information into `output_dir`, readable by every user.
    pub fn write(&self, output_dir: &Path) -> Result<(), MetadataError> {
        let path = output_dir.join(BUILD_INFO_FILE);
        let write_error = |source| MetadataError::Write {
            path: path.clone(),
            source,
        };

        let contents = serde_json::to_vec(self).map_err(|source| MetadataError::Parse {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, contents).map_err(write_error)?;
        set_open_permissions(&path).map_err(write_error)?;

        Ok(())
    }
}

/// Content of `chaincode.json`, supplied by the peer at run time.
#[derive(Debug, Clone, Deserialize)]
pub struct RunMetadata {
    pub chaincode_id: String,
    pub peer_address: String,
    #[serde(default)]
    pub client_cert: String,
    #[serde(default = "empty_secret", deserialize_with = "deserialize_secret")]
    pub client_key: SecretString,
    #[serde(default)]
    pub root_cert: String,
    pub mspid: String,
    /// Per-chaincode resources overriding the launcher defaults.
    #[serde(default)]
    pub resources: ResourcesConfig,
}

/// Everything needed to create the chaincode pod.
#[derive(Debug, Clone)]
pub struct ChaincodeRunConfig {
    pub chaincode_id: String,
    pub mspid: String,
    pub peer_address: String,
    pub tls: TlsArtifacts,
    /// Name derived from the chaincode id, safe to embed in object names.
    pub short_name: String,
    pub resources: ResourcesConfig,
    pub image: String,
    pub platform: Platform,
}

impl ChaincodeRunConfig {
    /// Assembles the run configuration from the peer supplied `chaincode.json` and the
    /// build information left in `output_dir`.
    ///
    /// `peer_address` replaces the address found in `chaincode.json` when set.
    pub fn load(
        metadata_dir: &Path,
        output_dir: &Path,
        peer_address: Option<&str>,
    ) -> Result<Self, MetadataError> {
        let metadata: RunMetadata = read_json(&metadata_dir.join(RUN_CONFIG_FILE))?;
        let short_name = short_name(&metadata.chaincode_id)?;
        let build_info = BuildInformation::read(output_dir)?;
        let platform = build_info.platform.parse()?;

        Ok(Self {
            short_name,
            peer_address: peer_address
                .map(str::to_owned)
                .unwrap_or(metadata.peer_address),
            tls: TlsArtifacts {
                root_cert: metadata.root_cert,
                client_cert: metadata.client_cert,
                client_key: metadata.client_key,
            },
            chaincode_id: metadata.chaincode_id,
            mspid: metadata.mspid,
            resources: metadata.resources,
            image: build_info.image,
            platform,
        })
    }
}

/// Derives the short name of a chaincode from its `<name>:<hash>` id.
///
/// Characters of the name that are not ASCII alphanumeric become `-`, the
/// name is lowercased and joined with the first [`SHORT_HASH_LEN`] characters
/// of the hash: `fabcar_1:abcdef0123456789` gives `fabcar-1-abcdef01`.
pub fn short_name(chaincode_id: &str) -> Result<String, MetadataError> {
    let (name, hash) = chaincode_id
        .split_once(':')
        .ok_or_else(|| MetadataError::MalformedChaincodeId(chaincode_id.to_owned()))?;

    let hash = hash
        .get(..SHORT_HASH_LEN)
        .ok_or_else(|| MetadataError::ChaincodeHashTooShort(chaincode_id.to_owned()))?;

    let name: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    Ok(format!("{name}-{}", hash.to_lowercase()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, MetadataError> {
    let contents = fs::read(path).map_err(|source| MetadataError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&contents).map_err(|source| MetadataError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn set_open_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o777))
}

#[cfg(not(unix))]
fn set_open_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}
