//! Deduplicating media export engine
//!
//! [`MediaExporter`] streams through notes, resolves the media each one
//! references, filters by exclusion set and extension allow-list,
//! deduplicates across the run, and copies surviving files into the
//! destination folder. [`Export`] is pull-based: no work happens between
//! pulls, which makes cancellation cooperative and exact.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::error::{MedexError, Result};
use crate::media::extract_media_filenames;
use crate::note::Note;

/// Audio extension allow-list used by `--audio-only`
pub const AUDIO_EXTS: &[&str] = &[
    "3gp", "aac", "avi", "flac", "flv", "m4a", "mkv", "mov", "mp3", "mp4", "mpeg", "mpg", "oga",
    "ogg", "ogv", "ogx", "opus", "spx", "swf", "wav", "webm",
];

/// Notes between progress emissions, unless overridden
pub const DEFAULT_PROGRESS_BATCH: usize = 2500;

/// One step of the export sequence
///
/// `filenames` is the resolver output for this note before any
/// filtering, so callers can display per-note diagnostics even for
/// names that were excluded or already seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportStep {
    /// Distinct files copied so far, monotonically non-decreasing
    pub exported: usize,
    pub filenames: Vec<String>,
}

/// Configured exporter; one export call per instance lifecycle
#[derive(Debug, Clone)]
pub struct MediaExporter {
    media_dir: PathBuf,
    dest: PathBuf,
    extensions: Option<HashSet<String>>,
    excluded: HashSet<String>,
    field: Option<String>,
}

impl MediaExporter {
    pub fn new(media_dir: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        MediaExporter {
            media_dir: media_dir.into(),
            dest: dest.into(),
            extensions: None,
            excluded: HashSet::new(),
            field: None,
        }
    }

    /// Restrict export to the audio allow-list
    pub fn audio_only(self, audio_only: bool) -> Self {
        if audio_only {
            self.with_extensions(AUDIO_EXTS.iter().map(|e| e.to_string()))
        } else {
            self
        }
    }

    /// Keep only files with one of these extensions (no leading dot,
    /// matched case-sensitively). An empty set means no filter.
    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = String>) -> Self {
        let extensions: HashSet<String> = extensions.into_iter().collect();
        self.extensions = if extensions.is_empty() {
            None
        } else {
            Some(extensions)
        };
        self
    }

    /// Filenames to skip unconditionally, regardless of other filters
    pub fn with_excluded(mut self, excluded: impl IntoIterator<Item = String>) -> Self {
        self.excluded = excluded.into_iter().collect();
        self
    }

    /// Scan only this field for media references
    pub fn with_field(mut self, field: Option<String>) -> Self {
        self.field = field;
        self
    }

    /// Start an export over `notes`
    ///
    /// The destination folder must already exist; the engine never
    /// creates it.
    pub fn export<I>(&self, notes: I) -> Result<Export<I::IntoIter>>
    where
        I: IntoIterator<Item = Note>,
    {
        if !self.dest.is_dir() {
            return Err(MedexError::DestinationMissing {
                path: self.dest.clone(),
            });
        }
        Ok(Export {
            notes: notes.into_iter(),
            options: self.clone(),
            seen: HashSet::new(),
            exported: 0,
            failed: false,
        })
    }
}

/// Pull-based export sequence; one item per note
///
/// A copy failure is fatal: the iterator yields the error once and is
/// fused afterwards. Files copied before the failure remain on disk.
pub struct Export<I> {
    notes: I,
    options: MediaExporter,
    seen: HashSet<String>,
    exported: usize,
    failed: bool,
}

impl<I> fmt::Debug for Export<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Export")
            .field("options", &self.options)
            .field("exported", &self.exported)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl<I> Export<I>
where
    I: Iterator<Item = Note>,
{
    fn copy_new_files(&mut self, filenames: &BTreeSet<String>) -> Result<()> {
        for filename in filenames {
            if self.options.excluded.contains(filename) {
                continue;
            }
            // first occurrence wins; later notes never re-attempt a copy
            if !self.seen.insert(filename.clone()) {
                continue;
            }
            if let Some(extensions) = &self.options.extensions {
                if !extensions.contains(extension_of(filename)) {
                    continue;
                }
            }
            let src = self.options.media_dir.join(filename);
            if !src.exists() {
                debug!(filename = %filename, "referenced media missing from storage");
                continue;
            }
            let Some(base) = Path::new(filename).file_name() else {
                continue;
            };
            // overwrite: last writer wins, divergent same-name content
            // is a documented limitation
            let dest = self.options.dest.join(base);
            fs::copy(&src, &dest).map_err(|e| MedexError::Copy {
                filename: filename.clone(),
                dest,
                source: e,
            })?;
            self.exported += 1;
        }
        Ok(())
    }
}

impl<I> Iterator for Export<I>
where
    I: Iterator<Item = Note>,
{
    type Item = Result<ExportStep>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let note = self.notes.next()?;
        let filenames = extract_media_filenames(&note, self.options.field.as_deref());
        if let Err(e) = self.copy_new_files(&filenames) {
            self.failed = true;
            return Some(Err(e));
        }
        Some(Ok(ExportStep {
            exported: self.exported,
            filenames: filenames.into_iter().collect(),
        }))
    }
}

/// Extension after the last dot, without the dot; empty when none
fn extension_of(filename: &str) -> &str {
    filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
}

/// Progress snapshot handed to the caller's sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProgress {
    pub notes_processed: usize,
    pub note_total: usize,
    pub files_exported: usize,
}

/// Outcome of a driven export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub notes_processed: usize,
    pub files_exported: usize,
    pub cancelled: bool,
}

/// Drive an export to completion, emitting batched progress
///
/// Invokes `progress` every `batch` notes and checks `cancel` at the
/// same cadence; when cancelled, stops pulling immediately (no rollback
/// of files already copied). Copy failures propagate.
pub fn drive<I>(
    export: Export<I>,
    note_total: usize,
    batch: usize,
    progress: &mut dyn FnMut(ExportProgress),
    cancel: &AtomicBool,
) -> Result<ExportSummary>
where
    I: Iterator<Item = Note>,
{
    let batch = batch.max(1);
    let mut notes_processed = 0;
    let mut files_exported = 0;
    for (index, step) in export.enumerate() {
        let step = step?;
        notes_processed = index + 1;
        files_exported = step.exported;
        if index % batch == 0 {
            progress(ExportProgress {
                notes_processed,
                note_total,
                files_exported,
            });
            if cancel.load(Ordering::Relaxed) {
                return Ok(ExportSummary {
                    notes_processed,
                    files_exported,
                    cancelled: true,
                });
            }
        }
    }
    progress(ExportProgress {
        notes_processed,
        note_total,
        files_exported,
    });
    Ok(ExportSummary {
        notes_processed,
        files_exported,
        cancelled: false,
    })
}
