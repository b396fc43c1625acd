use chrono::Utc;
use memo_core::{ClientConfig, NoteId};

use crate::commands::common::{
    build_notes_client, normalize_note_identifier, relative_or_raw, render_tags,
};
use crate::error::CliError;

pub async fn run_show(id: &str, as_json: bool, config: &ClientConfig) -> Result<(), CliError> {
    let id = normalize_note_identifier(id)?;
    let client = build_notes_client(config)?;
    let note = client.get_note(&NoteId::new(id)).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&note)?);
        return Ok(());
    }

    let now_ms = Utc::now().timestamp_millis();
    println!("{}", note.title);
    println!(
        "{}  updated {}{}",
        note.id,
        relative_or_raw(&note.updated_at, now_ms),
        if note.archived { "  (archived)" } else { "" }
    );
    if !note.tags.is_empty() {
        println!("{}", render_tags(&note.tags));
    }
    println!();
    println!("{}", note.content);

    Ok(())
}
