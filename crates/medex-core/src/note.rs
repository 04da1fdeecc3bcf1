//! Note parsing: YAML frontmatter + markdown body
//!
//! A note carries its textual content in named fields: the optional
//! `fields` map of the frontmatter plus the markdown body under the
//! implicit name [`BODY_FIELD`].

use std::collections::BTreeMap;
use std::iter;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MedexError, Result};

/// Implicit field name for the markdown body
pub const BODY_FIELD: &str = "body";

/// Note frontmatter (YAML header)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteFrontmatter {
    /// Note identifier (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Note title (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Creation timestamp (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Tags for categorization (optional)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Named textual fields that may reference media
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

/// A parsed note
#[derive(Debug, Clone, Default)]
pub struct Note {
    pub frontmatter: NoteFrontmatter,
    pub body: String,
    /// Source file, when the note came from disk
    pub path: Option<PathBuf>,
}

impl Note {
    /// Parse a note from its file content
    ///
    /// Content without a leading `---` frontmatter block is treated as
    /// all body; an opening delimiter without a closing one is an error.
    pub fn parse(content: &str, path: Option<PathBuf>) -> Result<Self> {
        let Some(rest) = content
            .strip_prefix("---\r\n")
            .or_else(|| content.strip_prefix("---\n"))
        else {
            return Ok(Note {
                frontmatter: NoteFrontmatter::default(),
                body: content.to_string(),
                path,
            });
        };
        let Some((frontmatter_end, body_start)) = closing_delimiter(rest) else {
            return Err(MedexError::InvalidFrontmatter {
                path: path.unwrap_or_default(),
                reason: "unterminated frontmatter".to_string(),
            });
        };
        let frontmatter: NoteFrontmatter =
            serde_yaml::from_str(&rest[..frontmatter_end]).map_err(|e| {
                MedexError::InvalidFrontmatter {
                    path: path.clone().unwrap_or_default(),
                    reason: e.to_string(),
                }
            })?;
        Ok(Note {
            frontmatter,
            body: rest[body_start..].to_string(),
            path,
        })
    }

    /// The text of one named field, `None` if the note has no such field
    pub fn field_text(&self, name: &str) -> Option<&str> {
        if name == BODY_FIELD {
            Some(&self.body)
        } else {
            self.frontmatter.fields.get(name).map(String::as_str)
        }
    }

    /// All textual fields, the body last
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.frontmatter
            .fields
            .iter()
            .map(|(name, text)| (name.as_str(), text.as_str()))
            .chain(iter::once((BODY_FIELD, self.body.as_str())))
    }

    /// Identifier for logs: frontmatter id, else the file name
    pub fn display_id(&self) -> String {
        if let Some(id) = &self.frontmatter.id {
            return id.clone();
        }
        self.path
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}

/// Byte offsets of the closing `---` line: (end of yaml, start of body)
fn closing_delimiter(rest: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((offset, offset + line.len()));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frontmatter_fields_and_body() {
        let content = "---\nid: nx-1\ntitle: Heart\nfields:\n  Front: '<img src=\"heart.png\">'\n  Back: 'Systole'\n---\nBody text\n";
        let note = Note::parse(content, None).unwrap();
        assert_eq!(note.frontmatter.id.as_deref(), Some("nx-1"));
        assert_eq!(
            note.field_text("Front"),
            Some("<img src=\"heart.png\">")
        );
        assert_eq!(note.field_text("body"), Some("Body text\n"));
        assert_eq!(note.field_text("Missing"), None);
    }

    #[test]
    fn content_without_frontmatter_is_all_body() {
        let note = Note::parse("just text ![d](a.jpg)", None).unwrap();
        assert!(note.frontmatter.fields.is_empty());
        assert_eq!(note.body, "just text ![d](a.jpg)");
    }

    #[test]
    fn unterminated_frontmatter_is_an_error() {
        let err = Note::parse("---\nid: nx-1\nno closing", None).unwrap_err();
        assert!(matches!(err, MedexError::InvalidFrontmatter { .. }));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = Note::parse("---\n: : :\n---\n", None).unwrap_err();
        assert!(matches!(err, MedexError::InvalidFrontmatter { .. }));
    }

    #[test]
    fn fields_iterator_ends_with_the_body() {
        let content = "---\nfields:\n  A: one\n  B: two\n---\nthree";
        let note = Note::parse(content, None).unwrap();
        let names: Vec<&str> = note.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["A", "B", "body"]);
    }

    #[test]
    fn closing_delimiter_at_eof_without_newline() {
        let note = Note::parse("---\nid: nx-2\n---", None).unwrap();
        assert_eq!(note.frontmatter.id.as_deref(), Some("nx-2"));
        assert_eq!(note.body, "");
    }
}
