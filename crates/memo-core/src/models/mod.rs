//! Data models shared across the client.

mod note;

pub use note::{
    normalize_tags, Note, NoteDraft, NoteId, NotePatch, ValidatedNote, CONTENT_MAX_CHARS,
    TAGS_MAX_COUNT, TAG_MAX_CHARS, TITLE_MAX_CHARS,
};
