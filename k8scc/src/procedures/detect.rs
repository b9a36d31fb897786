use k8scc_config::shared::LauncherConfig;
use std::path::PathBuf;
use tracing::{info, instrument};

use crate::error::LauncherError;
use crate::metadata::ChaincodeMetadata;
use crate::procedures::positional_args;

/// Arguments of `detect <source_dir> <metadata_dir>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectArgs {
    pub source_dir: PathBuf,
    pub metadata_dir: PathBuf,
}

impl DetectArgs {
    pub fn from_args(args: &[String]) -> Result<Self, LauncherError> {
        let [source_dir, metadata_dir] = positional_args("detect", args)?;

        Ok(Self {
            source_dir,
            metadata_dir,
        })
    }
}

/// Succeeds when this builder can build the chaincode described in `args.metadata_dir`.
///
/// The chaincode type must be a known platform with a builder image in `config`.
#[instrument(name = "detect", skip_all, fields(metadata_dir = %args.metadata_dir.display()))]
pub fn detect(config: &LauncherConfig, args: &DetectArgs) -> Result<(), LauncherError> {
    let metadata = ChaincodeMetadata::read(&args.metadata_dir)?;
    let platform = metadata.platform()?;
    if config.builder_image(&metadata.chaincode_type).is_none() {
        return Err(LauncherError::Configuration(format!(
            "no builder image configured for chaincode type {}",
            metadata.chaincode_type
        )));
    }

    info!(label = %metadata.label, %platform, "chaincode type supported");

    Ok(())
}
