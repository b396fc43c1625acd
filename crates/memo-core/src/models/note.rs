//! Note model and edit-buffer payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 120;
/// Maximum content length in characters.
pub const CONTENT_MAX_CHARS: usize = 10_000;
/// Maximum length of a single tag in characters.
pub const TAG_MAX_CHARS: usize = 50;
/// Maximum number of tags per note.
pub const TAGS_MAX_COUNT: usize = 50;

/// A unique identifier for a note.
///
/// Ids are assigned by the server and immutable after creation; the client
/// treats them as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A note as returned by the remote service.
///
/// `created_at` and `updated_at` are server-assigned; the client keeps them
/// as opaque display values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub archived: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// The edit buffer: a note being created or edited locally.
///
/// Never partially persisted; `validate` gates every save before any
/// network call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub archived: bool,
}

impl NoteDraft {
    /// Seed a draft from an existing note for editing.
    #[must_use]
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            tags: note.tags.clone(),
            archived: note.archived,
        }
    }

    /// Validate and normalize the draft into a submission body.
    ///
    /// Title and content must be non-empty after trimming and within their
    /// length bounds. Tags are trimmed, empties dropped, each truncated to
    /// [`TAG_MAX_CHARS`], capped at [`TAGS_MAX_COUNT`] entries; duplicates
    /// are kept as entered.
    pub fn validate(&self) -> Result<ValidatedNote> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::validation("title", "Title is required"));
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(Error::validation(
                "title",
                format!("Title must be {TITLE_MAX_CHARS} characters or less"),
            ));
        }

        let content = self.content.trim();
        if content.is_empty() {
            return Err(Error::validation("content", "Content is required"));
        }
        if content.chars().count() > CONTENT_MAX_CHARS {
            return Err(Error::validation(
                "content",
                format!("Content must be {CONTENT_MAX_CHARS} characters or less"),
            ));
        }

        Ok(ValidatedNote {
            title: title.to_string(),
            content: content.to_string(),
            tags: normalize_tags(&self.tags),
            archived: self.archived,
        })
    }
}

/// A draft that passed local validation, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedNote {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub archived: bool,
}

impl ValidatedNote {
    /// Full-field update body for `PUT /notes/{id}`.
    #[must_use]
    pub fn into_patch(self) -> NotePatch {
        NotePatch {
            title: Some(self.title),
            content: Some(self.content),
            tags: Some(self.tags),
            archived: Some(self.archived),
        }
    }
}

/// Any subset of the mutable note fields, for `PUT /notes/{id}`.
///
/// `None` fields are omitted from the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

/// Clean a tag list for submission: trim, drop empties, truncate each to
/// [`TAG_MAX_CHARS`] characters, cap at [`TAGS_MAX_COUNT`] entries.
#[must_use]
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(|tag| tag.chars().take(TAG_MAX_CHARS).collect())
        .take(TAGS_MAX_COUNT)
        .collect()
}
