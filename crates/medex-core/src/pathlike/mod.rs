//! Path-like abstraction over hierarchical stores
//!
//! A backend resolves a user-supplied locator to a single root container
//! at construction time, then lists descendant entries lazily through
//! [`PathLike::list_files`]. Transport details, pagination, and retry
//! policy are owned by each backend; callers only see fully materialized
//! entries or a [`PathLikeError`].

pub mod gdrive;
pub mod local;

use thiserror::Error;

/// Failures while resolving or listing a path-like tree
#[derive(Error, Debug)]
pub enum PathLikeError {
    #[error("no folder matches {locator:?}")]
    RootNotFound { locator: String },

    #[error("{locator:?} matches {count} folders; pass a folder link or id instead")]
    AmbiguousRoot { locator: String, count: usize },

    #[error("backend error: {reason}")]
    Backend { reason: String },
}

/// One node of a hierarchical store
///
/// `id` is backend identity (a Drive file id, a local path); `name` is a
/// single path segment, never a full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub id: String,
    pub name: String,
    pub is_container: bool,
}

/// An entry yielded by a listing, with its path relative to the root
///
/// `path` is the concatenation of ancestor names joined by `/`, without
/// a leading root marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    pub path: String,
    pub entry: PathEntry,
}

/// Capability interface for hierarchical stores
///
/// A value of an implementing type always holds a resolved root: the
/// locator-to-root resolution happens in the backend constructor, so
/// listing can never precede resolution.
pub trait PathLike {
    /// The resolved root container
    fn root(&self) -> &PathEntry;

    /// Direct children of `entry`, in listing order
    ///
    /// Listing a non-container entry yields an empty vec. Consuming this
    /// may trigger network or filesystem calls; pagination is followed
    /// internally.
    fn children(&self, entry: &PathEntry) -> Result<Vec<PathEntry>, PathLikeError>;

    /// Lazily enumerate entries under the root
    ///
    /// Recursive mode yields every leaf of the subtree with its full
    /// relative path; flat mode yields direct children only, containers
    /// included. The sequence is finite and not restartable.
    fn list_files(&self, recursive: bool) -> ListFiles<'_, Self>
    where
        Self: Sized,
    {
        ListFiles::new(self, recursive)
    }
}

/// Lazy listing iterator over a [`PathLike`] backend
///
/// Containers are expanded on demand off a work stack, so backend calls
/// happen only as the caller pulls. After yielding an error the iterator
/// is fused.
pub struct ListFiles<'a, B: PathLike> {
    backend: &'a B,
    recursive: bool,
    // pending entries, each paired with the path prefix of its parent
    stack: Vec<(String, PathEntry)>,
    seeded: bool,
    done: bool,
}

impl<'a, B: PathLike> ListFiles<'a, B> {
    fn new(backend: &'a B, recursive: bool) -> Self {
        ListFiles {
            backend,
            recursive,
            stack: Vec::new(),
            seeded: false,
            done: false,
        }
    }

    fn push_children(&mut self, prefix: &str, parent: &PathEntry) -> Result<(), PathLikeError> {
        let mut children = self.backend.children(parent)?;
        // popped last-in-first-out; reverse to keep listing order
        children.reverse();
        for child in children {
            self.stack.push((prefix.to_string(), child));
        }
        Ok(())
    }

    fn fail(&mut self, err: PathLikeError) -> Option<Result<ListedFile, PathLikeError>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<B: PathLike> Iterator for ListFiles<'_, B> {
    type Item = Result<ListedFile, PathLikeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.seeded {
            self.seeded = true;
            let root = self.backend.root().clone();
            if let Err(e) = self.push_children("", &root) {
                return self.fail(e);
            }
        }
        while let Some((prefix, entry)) = self.stack.pop() {
            let path = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", prefix, entry.name)
            };
            if entry.is_container && self.recursive {
                if let Err(e) = self.push_children(&path, &entry) {
                    return self.fail(e);
                }
                continue;
            }
            return Some(Ok(ListedFile { path, entry }));
        }
        self.done = true;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory tree backend: container ids map to child entries
    struct FakeTree {
        root: PathEntry,
        children: HashMap<String, Vec<PathEntry>>,
        calls: RefCell<usize>,
        fail_on: Option<String>,
    }

    fn dir(id: &str, name: &str) -> PathEntry {
        PathEntry {
            id: id.into(),
            name: name.into(),
            is_container: true,
        }
    }

    fn file(id: &str, name: &str) -> PathEntry {
        PathEntry {
            id: id.into(),
            name: name.into(),
            is_container: false,
        }
    }

    impl FakeTree {
        fn new(children: HashMap<String, Vec<PathEntry>>) -> Self {
            FakeTree {
                root: dir("root", "root"),
                children,
                calls: RefCell::new(0),
                fail_on: None,
            }
        }
    }

    impl PathLike for FakeTree {
        fn root(&self) -> &PathEntry {
            &self.root
        }

        fn children(&self, entry: &PathEntry) -> Result<Vec<PathEntry>, PathLikeError> {
            *self.calls.borrow_mut() += 1;
            if self.fail_on.as_deref() == Some(entry.id.as_str()) {
                return Err(PathLikeError::Backend {
                    reason: "simulated".into(),
                });
            }
            if !entry.is_container {
                return Ok(Vec::new());
            }
            Ok(self.children.get(&entry.id).cloned().unwrap_or_default())
        }
    }

    fn sample_tree() -> FakeTree {
        // root/ (folderX/(c.jpg), d.png)
        let mut children = HashMap::new();
        children.insert("root".to_string(), vec![dir("fx", "folderX"), file("d", "d.png")]);
        children.insert("fx".to_string(), vec![file("c", "c.jpg")]);
        FakeTree::new(children)
    }

    #[test]
    fn recursive_listing_yields_all_leaves_with_full_paths() {
        let tree = sample_tree();
        let mut paths: Vec<String> = tree
            .list_files(true)
            .map(|f| f.unwrap().path)
            .collect();
        paths.sort();
        assert_eq!(paths, vec!["d.png", "folderX/c.jpg"]);
    }

    #[test]
    fn flat_listing_yields_direct_children_including_containers() {
        let tree = sample_tree();
        let listed: Vec<ListedFile> = tree.list_files(false).map(|f| f.unwrap()).collect();
        assert_eq!(listed.len(), 2);
        assert!(listed
            .iter()
            .any(|f| f.path == "folderX" && f.entry.is_container));
        assert!(listed
            .iter()
            .any(|f| f.path == "d.png" && !f.entry.is_container));
    }

    #[test]
    fn recursive_listing_over_nested_containers_is_complete() {
        // a/(b/(f1, f2), f3), f4 -> 4 leaves
        let mut children = HashMap::new();
        children.insert("root".to_string(), vec![dir("a", "a"), file("4", "f4")]);
        children.insert(
            "a".to_string(),
            vec![dir("b", "b"), file("3", "f3")],
        );
        children.insert(
            "b".to_string(),
            vec![file("1", "f1"), file("2", "f2")],
        );
        let tree = FakeTree::new(children);
        let mut paths: Vec<String> = tree.list_files(true).map(|f| f.unwrap().path).collect();
        paths.sort();
        assert_eq!(paths, vec!["a/b/f1", "a/b/f2", "a/f3", "f4"]);
    }

    #[test]
    fn listing_is_lazy_until_pulled() {
        // root/ (fa/(f1), fb/(f2)) -> a full walk takes 3 expansions
        let mut children = HashMap::new();
        children.insert("root".to_string(), vec![dir("fa", "fa"), dir("fb", "fb")]);
        children.insert("fa".to_string(), vec![file("1", "f1")]);
        children.insert("fb".to_string(), vec![file("2", "f2")]);
        let tree = FakeTree::new(children);

        let iter = tree.list_files(true);
        assert_eq!(*tree.calls.borrow(), 0);
        drop(iter);

        let mut iter = tree.list_files(true);
        assert_eq!(iter.next().unwrap().unwrap().path, "fa/f1");
        // root and fa expanded; fb is still pending on the stack
        assert_eq!(*tree.calls.borrow(), 2);
        iter.by_ref().for_each(drop);
        assert_eq!(*tree.calls.borrow(), 3);
    }

    #[test]
    fn error_mid_listing_fuses_the_iterator() {
        let mut tree = sample_tree();
        tree.fail_on = Some("fx".to_string());
        let mut iter = tree.list_files(true);
        let mut saw_error = false;
        for item in iter.by_ref() {
            if item.is_err() {
                saw_error = true;
                break;
            }
        }
        assert!(saw_error);
        assert!(iter.next().is_none());
    }

    #[test]
    fn listing_a_leaf_yields_nothing() {
        let tree = sample_tree();
        let children = tree.children(&file("d", "d.png")).unwrap();
        assert!(children.is_empty());
    }
}
