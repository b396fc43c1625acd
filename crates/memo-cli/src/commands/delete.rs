use memo_core::{ClientConfig, NoteId};

use crate::commands::common::{
    build_engine, build_notes_client, confirm, normalize_note_identifier, text_preview,
};
use crate::error::CliError;

pub async fn run_delete(id: &str, yes: bool, config: &ClientConfig) -> Result<(), CliError> {
    let id = normalize_note_identifier(id)?;
    let note_id = NoteId::new(id);

    let engine = build_engine(config)?;
    // Seed the list cache so the optimistic removal and the reconciling
    // reload have something to work against; a failed seed is not fatal.
    if let Err(error) = engine.reload().await {
        tracing::debug!("pre-delete list load failed: {error}");
    }

    if !yes {
        let cached_title = engine
            .snapshot()
            .notes
            .iter()
            .find(|note| note.id == note_id)
            .map(|note| note.title.clone());
        let title = match cached_title {
            Some(title) => Some(title),
            None => build_notes_client(config)?
                .get_note(&note_id)
                .await
                .ok()
                .map(|note| note.title),
        };

        let prompt = title.map_or_else(
            || format!("Delete note {note_id}?"),
            |title| format!("Delete \"{}\"?", text_preview(&title, 50)),
        );
        if !confirm(&prompt)? {
            println!("Aborted.");
            return Ok(());
        }
    }

    engine.delete_note(&note_id).await?;
    println!("{note_id}");
    Ok(())
}
