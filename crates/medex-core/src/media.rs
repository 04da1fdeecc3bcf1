//! Media reference extraction from note text
//!
//! Pure scanning of embedded-media markup: HTML `src`/`data` attributes,
//! `[sound:...]` tags, and markdown images. No I/O.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::note::Note;

static HTML_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<(?:img|audio|video|source|embed)\b[^>]*?\bsrc=(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("valid html src regex")
});

static OBJECT_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<object\b[^>]*?\bdata=(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("valid object data regex")
});

static SOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[sound:([^\]]+)\]").expect("valid sound regex"));

static MD_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\(([^)\s]+)[^)]*\)").expect("valid md image regex"));

/// Filenames referenced by `note`, base names only
///
/// With `field` given, only that field's text is scanned; a field the
/// note does not have yields an empty set. Remote references
/// (`http://`, `https://`, `data:`) are ignored.
pub fn extract_media_filenames(note: &Note, field: Option<&str>) -> BTreeSet<String> {
    let mut filenames = BTreeSet::new();
    match field {
        Some(name) => {
            if let Some(text) = note.field_text(name) {
                scan_text(text, &mut filenames);
            }
        }
        None => {
            for (_, text) in note.fields() {
                scan_text(text, &mut filenames);
            }
        }
    }
    filenames
}

fn scan_text(text: &str, filenames: &mut BTreeSet<String>) {
    for regex in [&HTML_SRC_RE, &OBJECT_DATA_RE, &SOUND_RE, &MD_IMAGE_RE] {
        for captures in regex.captures_iter(text) {
            let raw = captures
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str())
                .next();
            if let Some(raw) = raw {
                push_filename(raw, filenames);
            }
        }
    }
}

fn push_filename(raw: &str, filenames: &mut BTreeSet<String>) {
    let raw = raw.trim();
    if raw.is_empty()
        || raw.starts_with("http://")
        || raw.starts_with("https://")
        || raw.starts_with("data:")
    {
        return;
    }
    // only the base name participates in matching and copying
    if let Some(base) = raw.rsplit('/').next().filter(|b| !b.is_empty()) {
        filenames.insert(base.to_string());
    }
}
