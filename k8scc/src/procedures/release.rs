use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::error::LauncherError;
use crate::fs::copy_dir_all;
use crate::procedures::positional_args;

/// State database indexes, relative to the build output.
const STATEDB_DIR: &str = "META-INF/statedb";
/// Connection information of chaincode running as a server, relative to the build output.
const SERVER_DIR: &str = "chaincode/server";

/// Arguments of `release <output_dir> <release_dir>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArgs {
    pub output_dir: PathBuf,
    pub release_dir: PathBuf,
}

impl ReleaseArgs {
    pub fn from_args(args: &[String]) -> Result<Self, LauncherError> {
        let [output_dir, release_dir] = positional_args("release", args)?;

        Ok(Self {
            output_dir,
            release_dir,
        })
    }
}

/// Hands the peer the metadata it consumes from a build: state database indexes
/// under `statedb` and server connection files under `chaincode/server`.
///
/// Missing directories are skipped.
#[instrument(name = "release", skip_all, fields(output_dir = %args.output_dir.display()))]
pub fn release(args: &ReleaseArgs) -> Result<(), LauncherError> {
    release_dir(&args.output_dir.join(STATEDB_DIR), &args.release_dir.join("statedb"))?;
    release_dir(&args.output_dir.join(SERVER_DIR), &args.release_dir.join(SERVER_DIR))?;

    Ok(())
}

fn release_dir(src: &Path, dest: &Path) -> Result<(), LauncherError> {
    if !src.is_dir() {
        debug!(path = %src.display(), "nothing to release");
        return Ok(());
    }

    copy_dir_all(src, dest).map_err(|source| LauncherError::Io {
        context: "failed to release into",
        path: dest.to_path_buf(),
        source,
    })?;
    info!(path = %dest.display(), "released");

    Ok(())
}
