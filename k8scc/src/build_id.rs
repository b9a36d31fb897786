//! Derivation of the identifier correlating a build with its later runs.
//!
//! The peer hands the launcher directories whose names follow a fixed
//! convention: one path segment reads `<name>-<hex hash>`, for example
//! `/tmp/fabric-fabcar_1-1860815d78bd593a.../src` at build time and
//! `.../builds/fabcar_1-1860815d78bd593a.../bld` at run time. Both phases
//! resolve the same identifier from that segment, which keys the staging
//! location in the exchange store.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Number of hash characters kept in a [`BuildId`].
pub const BUILD_ID_LEN: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildIdError {
    #[error(
        "path {0} has no `<name>-<hash>` segment with a hash of at least {BUILD_ID_LEN} hex characters"
    )]
    MalformedPath(PathBuf),
}

/// Short identifier of one chaincode build.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildId(String);

impl BuildId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves the [`BuildId`] encoded in `path`.
///
/// Segments are inspected from the deepest one upwards and the first one
/// ending in `-<hex>` with enough hex characters wins. Everything before the
/// last `-` of that segment is the chaincode name and may contain any
/// character, hyphens included.
pub fn resolve_build_id(path: &Path) -> Result<BuildId, BuildIdError> {
    path.components()
        .rev()
        .filter_map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .find_map(hash_of_segment)
        .map(|hash| BuildId(hash[..BUILD_ID_LEN].to_owned()))
        .ok_or_else(|| BuildIdError::MalformedPath(path.to_path_buf()))
}

fn hash_of_segment(segment: &str) -> Option<&str> {
    let (name, hash) = segment.rsplit_once('-')?;
    if name.is_empty() || hash.len() < BUILD_ID_LEN {
        return None;
    }

    hash.bytes().all(|b| b.is_ascii_hexdigit()).then_some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "1860815d78bd593aed9728d27eb8bb8c180b7e7e9918057eecb0cf6e4f38223d930256401";

    fn resolve(path: &str) -> Result<String, BuildIdError> {
        resolve_build_id(Path::new(path)).map(|id| id.to_string())
    }

    #[test]
    fn resolves_build_source_directory() {
        let path = format!("/tmp/fabric-fabcar_1-{HASH}/src");
        assert_eq!(resolve(&path).unwrap(), "1860815d78");
    }

    #[test]
    fn resolves_run_output_directory() {
        let path = format!("/var/hyperledger/production/externalbuilder/builds/fabcar_1-{HASH}/bld");
        assert_eq!(resolve(&path).unwrap(), "1860815d78");
    }

    #[test]
    fn name_content_and_depth_do_not_matter() {
        for path in [
            format!("fabric-my-cc-v2-{HASH}"),
            format!("/a/b/c/d/prefix-x-{HASH}/one/two/three"),
            format!("./prefix-{HASH}/src"),
        ] {
            assert_eq!(resolve(&path).unwrap(), "1860815d78", "{path}");
        }
    }

    #[test]
    fn deepest_matching_segment_wins() {
        let path = format!("/tmp/fabric-other-abcdefabcdef/fabcar-{HASH}/src");
        assert_eq!(resolve(&path).unwrap(), "1860815d78");
    }

    #[test]
    fn missing_or_short_hash_is_malformed() {
        for path in [
            "/tmp/fabric-fabcar/src",
            "/tmp/fabric-fabcar-123456789/src",
            "/tmp/fabric-fabcar-zz60815d78bd593a/src",
            "/tmp/-1860815d78bd593a/src",
            "/",
        ] {
            assert_eq!(
                resolve(path),
                Err(BuildIdError::MalformedPath(PathBuf::from(path))),
                "{path}"
            );
        }
    }
}
