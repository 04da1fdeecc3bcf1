//! Local-filesystem tree backend
//!
//! Treats a directory as a path-like tree. Useful for excluding files
//! already mirrored to a local sync folder, and as the second concrete
//! backend behind [`PathLike`].

use std::fs;
use std::path::Path;

use super::{PathEntry, PathLike, PathLikeError};

/// A local directory resolved as a tree root
#[derive(Debug)]
pub struct LocalRoot {
    root: PathEntry,
}

impl LocalRoot {
    /// Resolve `path` as the root container
    ///
    /// Fails with `RootNotFound` when the path does not exist or is not
    /// a directory.
    pub fn new(path: &Path) -> Result<Self, PathLikeError> {
        if !path.is_dir() {
            return Err(PathLikeError::RootNotFound {
                locator: path.display().to_string(),
            });
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(LocalRoot {
            root: PathEntry {
                id: path.display().to_string(),
                name,
                is_container: true,
            },
        })
    }
}

impl PathLike for LocalRoot {
    fn root(&self) -> &PathEntry {
        &self.root
    }

    fn children(&self, entry: &PathEntry) -> Result<Vec<PathEntry>, PathLikeError> {
        if !entry.is_container {
            return Ok(Vec::new());
        }
        let read_dir = fs::read_dir(&entry.id).map_err(|e| PathLikeError::Backend {
            reason: format!("failed to read {}: {}", entry.id, e),
        })?;
        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|e| PathLikeError::Backend {
                reason: format!("failed to read {}: {}", entry.id, e),
            })?;
            let file_type = dir_entry.file_type().map_err(|e| PathLikeError::Backend {
                reason: format!("failed to stat {}: {}", dir_entry.path().display(), e),
            })?;
            entries.push(PathEntry {
                id: dir_entry.path().display().to_string(),
                name: dir_entry.file_name().to_string_lossy().into_owned(),
                is_container: file_type.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_tree() -> tempfile::TempDir {
        // root/ (folderX/(c.jpg), d.png)
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("folderX")).unwrap();
        fs::write(dir.path().join("folderX").join("c.jpg"), b"jpg").unwrap();
        fs::write(dir.path().join("d.png"), b"png").unwrap();
        dir
    }

    #[test]
    fn recursive_listing_joins_ancestor_names() {
        let dir = sample_tree();
        let root = LocalRoot::new(dir.path()).unwrap();
        let mut paths: Vec<String> = root.list_files(true).map(|f| f.unwrap().path).collect();
        paths.sort();
        assert_eq!(paths, vec!["d.png", "folderX/c.jpg"]);
    }

    #[test]
    fn flat_listing_includes_containers() {
        let dir = sample_tree();
        let root = LocalRoot::new(dir.path()).unwrap();
        let listed: Vec<_> = root.list_files(false).map(|f| f.unwrap()).collect();
        assert_eq!(listed.len(), 2);
        assert!(listed
            .iter()
            .any(|f| f.path == "folderX" && f.entry.is_container));
    }

    #[test]
    fn debug_output_includes_the_resolved_root() {
        let dir = sample_tree();
        let root = LocalRoot::new(dir.path()).unwrap();
        let rendered = format!("{:?}", root);
        assert!(rendered.contains("is_container: true"));
    }

    #[test]
    fn missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalRoot::new(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, PathLikeError::RootNotFound { .. }));
    }

    #[test]
    fn file_as_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"x").unwrap();
        let err = LocalRoot::new(&file).unwrap_err();
        assert!(matches!(err, PathLikeError::RootNotFound { .. }));
    }
}
