use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One entry below the root of a walked tree.
pub(crate) struct TreeEntry {
    pub path: PathBuf,
    /// Path relative to the walked root, never empty.
    pub relative: PathBuf,
    pub file_type: fs::FileType,
}

/// Walks `root` depth-first in file name order without following symlinks.
///
/// The root itself is skipped and parents are always yielded before their
/// children.
pub(crate) fn walk_tree(root: &Path) -> impl Iterator<Item = io::Result<TreeEntry>> + '_ {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => return Some(Err(io::Error::from(err))),
            };
            let relative = entry.path().strip_prefix(root).ok()?.to_path_buf();
            if relative.as_os_str().is_empty() {
                return None;
            }

            Some(Ok(TreeEntry {
                file_type: entry.file_type(),
                path: entry.into_path(),
                relative,
            }))
        })
}

/// Recursively copies the directory `src` to `dest`, creating `dest` as needed.
pub(crate) fn copy_dir_all(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;

    for entry in walk_tree(src) {
        let entry = entry?;
        let target = dest.join(&entry.relative);

        if entry.file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type.is_symlink() {
            copy_symlink(&entry.path, &target)?;
        } else {
            fs::copy(&entry.path, &target)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    let link = fs::read_link(src)?;
    if dest.symlink_metadata().is_ok() {
        fs::remove_file(dest)?;
    }
    std::os::unix::fs::symlink(link, dest)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(src, dest).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_skips_root_and_sorts_by_name() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("b/c")).unwrap();
        fs::write(root.path().join("b/c/file"), "x").unwrap();
        fs::write(root.path().join("a"), "y").unwrap();

        let relative: Vec<_> = walk_tree(root.path())
            .map(|entry| entry.unwrap().relative)
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("a"),
                PathBuf::from("b"),
                PathBuf::from("b/c"),
                PathBuf::from("b/c/file"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn copy_keeps_nested_files_and_symlinks() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("statedb/couchdb/indexes")).unwrap();
        fs::write(src.path().join("statedb/couchdb/indexes/owner.json"), "{}").unwrap();
        std::os::unix::fs::symlink("statedb", src.path().join("current")).unwrap();

        let dest = tempfile::tempdir().unwrap();
        let target = dest.path().join("META-INF");
        copy_dir_all(src.path(), &target).unwrap();

        assert_eq!(
            fs::read_to_string(target.join("statedb/couchdb/indexes/owner.json")).unwrap(),
            "{}"
        );
        assert_eq!(
            fs::read_link(target.join("current")).unwrap(),
            PathBuf::from("statedb")
        );
    }
}
