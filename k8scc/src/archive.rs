//! Tar archives of whole directory trees.
//!
//! Entry names are relative to the archived directory and the directory
//! itself is never emitted, so extracting the archive under any destination
//! reproduces the original layout. Symlinks are stored as links and file
//! modes are kept.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::fs::walk_tree;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to archive {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to extract archive into {path}: {source}")]
    Extract {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Archives the content of `src` into an in-memory tar stream.
pub fn compress_dir(src: &Path) -> Result<Vec<u8>, ArchiveError> {
    let write_error = |source| ArchiveError::Write {
        path: src.to_path_buf(),
        source,
    };

    let mut builder = tar::Builder::new(Vec::new());
    builder.follow_symlinks(false);

    append_tree(&mut builder, src).map_err(write_error)?;

    builder.into_inner().map_err(write_error)
}

/// Extracts a tar stream produced by [`compress_dir`] into `dest`.
pub fn extract_archive(archive: &[u8], dest: &Path) -> Result<(), ArchiveError> {
    let mut archive = tar::Archive::new(archive);
    archive.set_preserve_permissions(true);

    fs::create_dir_all(dest)
        .and_then(|_| archive.unpack(dest))
        .map_err(|source| ArchiveError::Extract {
            path: dest.to_path_buf(),
            source,
        })
}

fn append_tree(builder: &mut tar::Builder<Vec<u8>>, root: &Path) -> io::Result<()> {
    for entry in walk_tree(root) {
        let entry = entry?;
        // Symlinks are not followed, a link to a directory is archived as a link.
        if entry.file_type.is_dir() {
            builder.append_dir(&entry.relative, &entry.path)?;
        } else {
            builder.append_path_with_name(&entry.path, &entry.relative)?;
        }
    }

    Ok(())
}
