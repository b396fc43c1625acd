use memo_core::{ClientConfig, EditorState, NoteId};

use crate::commands::common::{
    build_engine, capture_editor_input_with_initial, normalize_note_identifier,
};
use crate::error::CliError;

pub struct EditArgs {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub archive: bool,
    pub unarchive: bool,
}

impl EditArgs {
    const fn has_field_flags(&self) -> bool {
        self.title.is_some()
            || self.content.is_some()
            || self.tags.is_some()
            || self.archive
            || self.unarchive
    }
}

pub async fn run_edit(id: &str, args: EditArgs, config: &ClientConfig) -> Result<(), CliError> {
    let id = normalize_note_identifier(id)?;
    let note_id = NoteId::new(id);

    let engine = build_engine(config)?;
    engine.open_edit(&note_id).await?;
    let EditorState::Editing { mut draft, .. } = engine.snapshot().editor else {
        return Err(CliError::EditBufferClosed);
    };

    if args.has_field_flags() {
        if let Some(title) = args.title {
            draft.title = title;
        }
        if let Some(content) = args.content {
            draft.content = content;
        }
        if let Some(tags) = args.tags {
            draft.tags = tags;
        }
        if args.archive {
            draft.archived = true;
        }
        if args.unarchive {
            draft.archived = false;
        }
    } else {
        // No flags: hand the content to $EDITOR, like a quick edit.
        let Some(content) = capture_editor_input_with_initial(&draft.content)? else {
            engine.cancel_edit().await;
            println!("Aborted: empty content.");
            return Ok(());
        };
        draft.content = content;
    }

    engine.set_draft(draft).await;
    let note = engine.save().await?;
    println!("{}", note.id);
    Ok(())
}
