use memo_core::ClientConfig;

use crate::commands::common::{build_engine, format_note_lines, note_to_list_item, NoteListItem};
use crate::error::CliError;

pub async fn run_list(
    page: u32,
    search: Option<&str>,
    as_json: bool,
    config: &ClientConfig,
) -> Result<(), CliError> {
    let engine = build_engine(config)?;

    if let Some(term) = search {
        engine.set_search(term).await;
    }
    engine.reload().await?;
    if page > 1 {
        // Clamped against the totals the first load reported.
        engine.set_page(page).await?;
    }

    let snapshot = engine.snapshot();
    if as_json {
        let items = snapshot
            .notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if snapshot.notes.is_empty() {
        println!("No notes found.");
        return Ok(());
    }

    for line in format_note_lines(&snapshot.notes) {
        println!("{line}");
    }
    println!(
        "Page {} of {} ({} notes)",
        snapshot.query.page,
        snapshot.query.total_pages.max(1),
        snapshot.query.total
    );

    Ok(())
}
