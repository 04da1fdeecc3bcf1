//! On-disk note collection
//!
//! A collection root holds a `notes/` tree (directories are decks,
//! `*.md` files are notes) and a flat `media/` directory addressed by
//! base filename. The collection is read-only to the exporter.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{MedexError, Result};
use crate::note::Note;

pub const NOTES_DIR: &str = "notes";
pub const MEDIA_DIR: &str = "media";
pub const CONFIG_FILE: &str = "medex.toml";

/// Deck name addressing the whole collection
pub const ROOT_DECK: &str = ".";

/// An opened collection
#[derive(Debug)]
pub struct Collection {
    root: PathBuf,
}

impl Collection {
    /// Open an existing collection at the given path
    #[tracing::instrument(skip(path), fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(MedexError::CollectionNotFound {
                search_root: path.to_path_buf(),
            });
        }
        if !path.join(NOTES_DIR).is_dir() {
            return Err(MedexError::InvalidCollection {
                root: path.to_path_buf(),
                reason: format!("missing {}/ directory", NOTES_DIR),
            });
        }
        if !path.join(MEDIA_DIR).is_dir() {
            return Err(MedexError::InvalidCollection {
                root: path.to_path_buf(),
                reason: format!("missing {}/ directory", MEDIA_DIR),
            });
        }
        Ok(Collection {
            root: path.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The flat media storage directory
    pub fn media_dir(&self) -> PathBuf {
        self.root.join(MEDIA_DIR)
    }

    /// Collection-local config file path (may not exist)
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Number of notes in scope, for progress totals
    pub fn note_count(&self, deck: &str, include_subdecks: bool) -> Result<usize> {
        Ok(self.note_paths(deck, include_subdecks)?.len())
    }

    /// Notes of a deck in deterministic order
    ///
    /// Unparseable note files are logged and skipped, not fatal.
    pub fn notes(
        &self,
        deck: &str,
        include_subdecks: bool,
    ) -> Result<impl Iterator<Item = Note> + '_> {
        let paths = self.note_paths(deck, include_subdecks)?;
        Ok(paths.into_iter().filter_map(|path| {
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read note");
                    return None;
                }
            };
            match Note::parse(&content, Some(path.clone())) {
                Ok(note) => Some(note),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse note");
                    None
                }
            }
        }))
    }

    fn deck_dir(&self, deck: &str) -> Result<PathBuf> {
        let notes_root = self.root.join(NOTES_DIR);
        if deck.is_empty() || deck == ROOT_DECK {
            return Ok(notes_root);
        }
        let relative = Path::new(deck);
        let well_formed = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !well_formed {
            return Err(MedexError::Usage(format!(
                "deck must be a relative path under {}/: {}",
                NOTES_DIR, deck
            )));
        }
        let dir = notes_root.join(relative);
        if !dir.is_dir() {
            return Err(MedexError::DeckNotFound {
                deck: deck.to_string(),
            });
        }
        Ok(dir)
    }

    fn note_paths(&self, deck: &str, include_subdecks: bool) -> Result<Vec<PathBuf>> {
        let dir = self.deck_dir(deck)?;
        let mut walk = WalkDir::new(&dir).follow_links(true).sort_by_file_name();
        if !include_subdecks {
            walk = walk.max_depth(1);
        }
        let mut paths = Vec::new();
        for entry in walk.into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "md") {
                paths.push(path.to_path_buf());
            }
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn collection_with(notes: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(NOTES_DIR)).unwrap();
        fs::create_dir(dir.path().join(MEDIA_DIR)).unwrap();
        for (rel, content) in notes {
            let path = dir.path().join(NOTES_DIR).join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn open_rejects_missing_layout() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Collection::open(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(missing, MedexError::CollectionNotFound { .. }));

        let invalid = Collection::open(dir.path()).unwrap_err();
        assert!(matches!(invalid, MedexError::InvalidCollection { .. }));
    }

    #[test]
    fn deck_scoping_with_and_without_subdecks() {
        let dir = collection_with(&[
            ("anatomy/a.md", "one"),
            ("anatomy/heart/b.md", "two"),
            ("chemistry/c.md", "three"),
        ]);
        let collection = Collection::open(dir.path()).unwrap();

        assert_eq!(collection.note_count("anatomy", true).unwrap(), 2);
        assert_eq!(collection.note_count("anatomy", false).unwrap(), 1);
        assert_eq!(collection.note_count(ROOT_DECK, true).unwrap(), 3);
    }

    #[test]
    fn unknown_deck_is_an_error() {
        let dir = collection_with(&[("a.md", "x")]);
        let collection = Collection::open(dir.path()).unwrap();
        let err = collection.note_count("missing", true).unwrap_err();
        assert!(matches!(err, MedexError::DeckNotFound { .. }));
    }

    #[test]
    fn deck_paths_may_not_escape_the_notes_tree() {
        let dir = collection_with(&[("a.md", "x")]);
        let collection = Collection::open(dir.path()).unwrap();
        let err = collection.note_count("../media", true).unwrap_err();
        assert!(matches!(err, MedexError::Usage(_)));
    }

    #[test]
    fn unparseable_notes_are_skipped() {
        let dir = collection_with(&[
            ("good.md", "---\nid: nx-1\n---\nok"),
            ("bad.md", "---\nid: nx-2\nnever closed"),
        ]);
        let collection = Collection::open(dir.path()).unwrap();
        let notes: Vec<Note> = collection.notes(ROOT_DECK, true).unwrap().collect();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].frontmatter.id.as_deref(), Some("nx-1"));
    }

    #[test]
    fn iteration_order_is_deterministic() {
        let dir = collection_with(&[("b.md", "b"), ("a.md", "a"), ("c.md", "c")]);
        let collection = Collection::open(dir.path()).unwrap();
        let ids: Vec<String> = collection
            .notes(ROOT_DECK, true)
            .unwrap()
            .map(|n| n.display_id())
            .collect();
        assert_eq!(ids, vec!["a.md", "b.md", "c.md"]);
    }
}
