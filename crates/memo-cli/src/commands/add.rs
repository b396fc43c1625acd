use memo_core::{ClientConfig, NoteDraft};

use crate::commands::common::{build_engine, resolve_note_content};
use crate::error::CliError;

pub async fn run_add(
    title: &str,
    content_parts: &[String],
    tags: &[String],
    config: &ClientConfig,
) -> Result<(), CliError> {
    let content = resolve_note_content(content_parts)?;

    let engine = build_engine(config)?;
    engine.open_create().await;
    engine
        .set_draft(NoteDraft {
            title: title.to_string(),
            content,
            tags: tags.to_vec(),
            archived: false,
        })
        .await;

    let note = engine.save().await?;
    println!("{}", note.id);
    Ok(())
}
