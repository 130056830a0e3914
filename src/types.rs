//! Shared types used across all pipeline stages.
//!
//! These types are serialized to JSON between stages (scan → process →
//! generate) and must be identical across all three modules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a book sits in the reading lifecycle.
///
/// Frontmatter is parsed leniently through [`ReadingStatus::parse`],
/// which accepts the synonyms people actually write; manifests and CSS
/// class names use the canonical kebab-case form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingStatus {
    Reading,
    Done,
    #[default]
    ToRead,
    Abandoned,
}

impl ReadingStatus {
    /// Map a raw frontmatter value onto a canonical status. Unknown
    /// values read as `to-read`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "reading" | "in progress" | "in-progress" => Self::Reading,
            "done" | "finished" | "complete" | "completed" | "read" => Self::Done,
            "to-read" | "to read" | "want to read" | "tbr" => Self::ToRead,
            "abandoned" | "dnf" => Self::Abandoned,
            _ => Self::ToRead,
        }
    }

    /// Strict parse for query filters: only the canonical names count.
    pub fn parse_canonical(value: &str) -> Option<Self> {
        match value {
            "reading" => Some(Self::Reading),
            "done" => Some(Self::Done),
            "to-read" => Some(Self::ToRead),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::Done => "done",
            Self::ToRead => "to-read",
            Self::Abandoned => "abandoned",
        }
    }
}

/// One book note as discovered by the scan stage.
///
/// A note counts as a book when its frontmatter carries a page count.
/// Everything here is resolved at scan time; later stages never re-read
/// the note.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    /// File stem of the source note.
    pub filename: String,
    /// URL slug; also names the processed cover file.
    pub slug: String,
    /// Note path relative to the source root, forward slashes.
    pub path: String,
    pub pages: u32,
    /// Explicit spine color from frontmatter; absent means the palette
    /// assigns one by stack position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub status: ReadingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_finished: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Cover image path relative to the source root, when the note names
    /// one that exists and has a decodable extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    /// Markdown body after the frontmatter block.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    /// Every frontmatter field verbatim, for display templates.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// A note containing at least one `bookstack` query block.
///
/// The body is carried verbatim; blocks are parsed and evaluated at
/// generate time so a shelf always reflects the final book list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shelf {
    pub title: String,
    pub slug: String,
    /// Note path relative to the source root, forward slashes.
    pub path: String,
    pub body: String,
}
