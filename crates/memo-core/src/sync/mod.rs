//! Client-side synchronization between local UI state and the remote note
//! store.
//!
//! `NotesSync` is the single owner of the list query, the cached note page,
//! the edit buffer, and the surfaced error. Every mutation goes through its
//! methods, and every state change is published as an immutable [`Snapshot`]
//! on a watch channel for the view layer to redraw from. There is exactly
//! one logical writer; remote calls are awaited with no lock held across
//! them, and responses are ordered by request sequence number so the
//! displayed list always reflects the most recently issued request.

mod timer;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};

use crate::api::{NotesApiClient, NotesPage};
use crate::error::{Error, ErrorClass, Result};
use crate::models::{Note, NoteDraft, NoteId};
use crate::util::truncate_chars;
use timer::CancellableTimer;

/// Page size for the notes list, fixed in this design.
pub const PER_PAGE: u32 = 10;

const SEARCH_MAX_CHARS: usize = 200;

/// Timing knobs for the engine. Tests inject short durations; production
/// uses the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Quiet window after the last search keystroke before a reload fires.
    pub debounce: Duration,
    /// Base delay for background list-read retries; attempt `n` waits
    /// `retry_base * n`.
    pub retry_base: Duration,
    /// Maximum number of background retries per failure streak.
    pub max_retries: u32,
    /// How long a surfaced error stays visible without a success or an
    /// explicit dismissal.
    pub error_ttl: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            retry_base: Duration::from_secs(2),
            max_retries: 3,
            error_ttl: Duration::from_secs(10),
        }
    }
}

/// Current page, search term, and totals derived from the last successful
/// fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub page: u32,
    pub per_page: u32,
    pub search: String,
    /// Total notes matching the query, as reported by the server.
    pub total: u64,
    /// Total pages, as reported by the server; never derived locally.
    pub total_pages: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: PER_PAGE,
            search: String::new(),
            total: 0,
            total_pages: 1,
        }
    }
}

/// The edit-buffer lifecycle: at most one note is being created or edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    Closed,
    Creating(NoteDraft),
    Editing { id: NoteId, draft: NoteDraft },
}

impl EditorState {
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// The last surfaced error plus retry bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorState {
    pub message: String,
    pub class: ErrorClass,
    /// Field the message refers to, for local validation errors.
    pub field: Option<String>,
    /// Background retries scheduled so far for the current failure streak.
    pub retry_count: u32,
}

/// An immutable view of the engine state, published on every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub notes: Vec<Note>,
    pub query: QueryState,
    /// True while a user-triggered load is in flight. Background loads
    /// (retries, delete reconciliation) never set this.
    pub loading: bool,
    pub error: Option<ErrorState>,
    pub editor: EditorState,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum LoadKind {
    Foreground,
    Background,
}

enum SaveAction {
    Create(NoteDraft),
    Update(NoteId, NoteDraft),
}

struct Inner {
    query: QueryState,
    notes: Vec<Note>,
    editor: EditorState,
    error: Option<ErrorState>,
    loading: bool,
    retry_count: u32,
    /// Sequence number of the most recently issued list request. Responses
    /// carrying an older number are discarded.
    seq: u64,
    /// Bumped on every recorded error so a stale display-timeout fire
    /// cannot clear a newer error.
    error_epoch: u64,
    debounce: CancellableTimer,
    retry: CancellableTimer,
    error_clear: CancellableTimer,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl Inner {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            notes: self.notes.clone(),
            query: self.query.clone(),
            loading: self.loading,
            error: self.error.clone(),
            editor: self.editor.clone(),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn apply_page(&mut self, page: NotesPage) {
        self.notes = page.notes;
        self.query.total = page.total;
        self.query.total_pages = page.total_pages;
    }
}

/// The notes state-store: owns QueryState, the list cache, the edit buffer,
/// and error/retry bookkeeping.
#[derive(Clone)]
pub struct NotesSync {
    inner: Arc<Mutex<Inner>>,
    client: NotesApiClient,
    options: SyncOptions,
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl NotesSync {
    pub fn new(client: NotesApiClient, options: SyncOptions) -> Self {
        let initial = Snapshot {
            notes: Vec::new(),
            query: QueryState::default(),
            loading: false,
            error: None,
            editor: EditorState::Closed,
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let inner = Inner {
            query: QueryState::default(),
            notes: Vec::new(),
            editor: EditorState::Closed,
            error: None,
            loading: false,
            retry_count: 0,
            seq: 0,
            error_epoch: 0,
            debounce: CancellableTimer::new(),
            retry: CancellableTimer::new(),
            error_clear: CancellableTimer::new(),
            snapshot_tx,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
            client,
            options,
            snapshot_rx,
        }
    }

    /// The latest published state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to state changes; the view layer redraws from this.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// Update the search term: trim, truncate to 200 characters, reset to
    /// page 1, and restart the debounce window. Only the last call within
    /// the window triggers a reload, and the reload always fires on a term
    /// change even when already on page 1.
    pub async fn set_search(&self, term: &str) {
        let term = truncate_chars(term.trim(), SEARCH_MAX_CHARS);

        let mut inner = self.inner.lock().await;
        if inner.query.search == term {
            return;
        }
        inner.query.search = term;
        inner.query.page = 1;
        inner.publish();

        let engine = self.clone();
        inner.debounce.schedule(self.options.debounce, async move {
            if let Err(error) = engine.reload().await {
                tracing::debug!("debounced reload failed: {error}");
            }
        });
    }

    /// Navigate to a page, clamped to `[1, total_pages]`. A no-op when the
    /// clamped target equals the current page; otherwise reloads
    /// immediately, without debounce.
    pub async fn set_page(&self, page: u32) -> Result<()> {
        let changed = {
            let mut inner = self.inner.lock().await;
            let clamped = page.clamp(1, inner.query.total_pages.max(1));
            if clamped == inner.query.page {
                false
            } else {
                inner.query.page = clamped;
                inner.publish();
                true
            }
        };

        if changed {
            self.reload().await
        } else {
            Ok(())
        }
    }

    /// User-triggered reload of the current query. Shows the loading flag
    /// and cancels any pending background retry.
    pub async fn reload(&self) -> Result<()> {
        self.reload_with(LoadKind::Foreground).await
    }

    fn reload_with(
        &self,
        kind: LoadKind,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
        let (seq, page, per_page, search) = {
            let mut inner = self.inner.lock().await;
            if kind == LoadKind::Foreground {
                inner.retry.cancel();
                inner.loading = true;
            }
            inner.seq += 1;
            let issued = (
                inner.seq,
                inner.query.page,
                inner.query.per_page,
                inner.query.search.clone(),
            );
            if kind == LoadKind::Foreground {
                inner.publish();
            }
            issued
        };

        let outcome = self.client.list_notes(page, per_page, &search).await;

        let mut inner = self.inner.lock().await;
        if seq != inner.seq {
            // A newer request was issued while this one was in flight; its
            // response owns the list now.
            tracing::debug!(seq, latest = inner.seq, "discarding stale list response");
            return Ok(());
        }

        match outcome {
            Ok(page_data) => {
                inner.apply_page(page_data);
                inner.loading = false;
                inner.retry_count = 0;
                inner.error = None;
                inner.error_clear.cancel();
                inner.publish();
                Ok(())
            }
            Err(error) => {
                inner.loading = false;
                self.record_error(&mut inner, &error);

                let class = error.classification();
                if class.is_retryable_for_list() && inner.retry_count < self.options.max_retries {
                    inner.retry_count += 1;
                    let attempt = inner.retry_count;
                    if let Some(state) = inner.error.as_mut() {
                        state.retry_count = attempt;
                    }

                    let engine = self.clone();
                    let retry: std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> =
                        Box::pin(async move {
                            tracing::debug!(attempt, "background list retry");
                            if let Err(retry_error) =
                                engine.reload_with(LoadKind::Background).await
                            {
                                tracing::debug!("background retry failed: {retry_error}");
                            }
                        });
                    inner
                        .retry
                        .schedule(self.options.retry_base * attempt, retry);
                }

                inner.publish();
                Err(error)
            }
        }
        })
    }

    /// Open the edit buffer for a new note. Ignored while another buffer is
    /// open; the view layer disables the triggering controls.
    pub async fn open_create(&self) {
        let mut inner = self.inner.lock().await;
        if inner.editor.is_open() {
            tracing::debug!("ignoring open_create while an edit buffer is open");
            return;
        }
        inner.editor = EditorState::Creating(NoteDraft::default());
        inner.publish();
    }

    /// Open the edit buffer for an existing note, using the cached copy
    /// when present and fetching it otherwise.
    pub async fn open_edit(&self, id: &NoteId) -> Result<()> {
        let cached = {
            let inner = self.inner.lock().await;
            if inner.editor.is_open() {
                tracing::debug!("ignoring open_edit while an edit buffer is open");
                return Ok(());
            }
            inner.notes.iter().find(|note| &note.id == id).cloned()
        };

        let note = match cached {
            Some(note) => note,
            None => match self.client.get_note(id).await {
                Ok(note) => note,
                Err(error) => {
                    let mut inner = self.inner.lock().await;
                    self.record_error(&mut inner, &error);
                    inner.publish();
                    return Err(error);
                }
            },
        };

        let mut inner = self.inner.lock().await;
        if inner.editor.is_open() {
            return Ok(());
        }
        inner.editor = EditorState::Editing {
            id: note.id.clone(),
            draft: NoteDraft::from_note(&note),
        };
        inner.publish();
        Ok(())
    }

    /// Replace the open edit buffer's contents. Ignored when no buffer is
    /// open.
    pub async fn set_draft(&self, draft: NoteDraft) {
        let mut inner = self.inner.lock().await;
        match &mut inner.editor {
            EditorState::Creating(current) | EditorState::Editing { draft: current, .. } => {
                *current = draft;
            }
            EditorState::Closed => {
                tracing::debug!("ignoring draft update with no edit buffer open");
                return;
            }
        }
        inner.publish();
    }

    /// Discard the edit buffer without any network call.
    pub async fn cancel_edit(&self) {
        let mut inner = self.inner.lock().await;
        if !inner.editor.is_open() {
            return;
        }
        inner.editor = EditorState::Closed;
        inner.publish();
    }

    /// Validate and submit the edit buffer.
    ///
    /// Validation failures surface a field-level error and never reach the
    /// network. On remote success the buffer is discarded and the list is
    /// reloaded with the current query; on remote failure the buffer stays
    /// open for correction. Saves are never auto-retried.
    pub async fn save(&self) -> Result<Note> {
        let action = {
            let inner = self.inner.lock().await;
            match &inner.editor {
                EditorState::Closed => {
                    return Err(Error::Other("no note is being edited".to_string()))
                }
                EditorState::Creating(draft) => SaveAction::Create(draft.clone()),
                EditorState::Editing { id, draft } => {
                    SaveAction::Update(id.clone(), draft.clone())
                }
            }
        };

        let draft = match &action {
            SaveAction::Create(draft) | SaveAction::Update(_, draft) => draft,
        };
        let validated = match draft.validate() {
            Ok(validated) => validated,
            Err(error) => {
                let mut inner = self.inner.lock().await;
                self.record_error(&mut inner, &error);
                inner.publish();
                return Err(error);
            }
        };

        let outcome = match &action {
            SaveAction::Create(_) => self.client.create_note(&validated).await,
            SaveAction::Update(id, _) => {
                self.client.update_note(id, &validated.into_patch()).await
            }
        };

        match outcome {
            Ok(note) => {
                {
                    let mut inner = self.inner.lock().await;
                    inner.editor = EditorState::Closed;
                    inner.publish();
                }
                if let Err(error) = self.reload().await {
                    tracing::debug!("post-save reload failed: {error}");
                }
                Ok(note)
            }
            Err(error) => {
                let error = match (&action, error) {
                    (SaveAction::Update(_, _), Error::NotFound(_)) => {
                        Error::NotFound("Note not found. It may have been deleted.".to_string())
                    }
                    (_, other) => other,
                };
                let mut inner = self.inner.lock().await;
                self.record_error(&mut inner, &error);
                inner.publish();
                Err(error)
            }
        }
    }

    /// Delete a note the user has already confirmed.
    ///
    /// Applies an optimistic removal (note dropped from the cache, total
    /// decremented) before issuing the remote delete, then reconciles with
    /// a background reload regardless of the remote outcome. A remote 404
    /// is harmless: the note was already gone.
    pub async fn delete_note(&self, id: &NoteId) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            let before = inner.notes.len();
            inner.notes.retain(|note| &note.id != id);
            if inner.notes.len() < before {
                inner.query.total = inner.query.total.saturating_sub(1);
            }
            inner.publish();
        }

        let outcome = match self.client.delete_note(id).await {
            Ok(()) => Ok(()),
            Err(Error::NotFound(_)) => {
                tracing::debug!("note {id} was already deleted on the server");
                Ok(())
            }
            Err(error) => Err(error),
        };

        if let Err(error) = &outcome {
            let mut inner = self.inner.lock().await;
            self.record_error(&mut inner, error);
            inner.publish();
        }

        // Server truth overwrites the optimistic guess either way.
        if let Err(error) = self.reload_with(LoadKind::Background).await {
            tracing::debug!("delete reconciliation reload failed: {error}");
        }

        outcome
    }

    /// Explicitly clear the surfaced error.
    pub async fn dismiss_error(&self) {
        let mut inner = self.inner.lock().await;
        if inner.error.is_none() {
            return;
        }
        inner.error = None;
        inner.error_clear.cancel();
        inner.publish();
    }

    /// Record an error and arm the display timeout. Callers publish after
    /// any further bookkeeping.
    fn record_error(&self, inner: &mut Inner, error: &Error) {
        inner.error_epoch += 1;
        let epoch = inner.error_epoch;
        inner.error = Some(ErrorState {
            message: error.to_string(),
            class: error.classification(),
            field: error.field().map(str::to_string),
            retry_count: inner.retry_count,
        });

        let engine = self.clone();
        inner.error_clear.schedule(self.options.error_ttl, async move {
            let mut inner = engine.inner.lock().await;
            if inner.error_epoch == epoch && inner.error.is_some() {
                inner.error = None;
                inner.publish();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;
    use tokio::time::sleep;

    fn test_options() -> SyncOptions {
        SyncOptions {
            debounce: Duration::from_millis(30),
            retry_base: Duration::from_millis(25),
            max_retries: 3,
            error_ttl: Duration::from_secs(30),
        }
    }

    fn engine_for(server: &mockito::Server, options: SyncOptions) -> NotesSync {
        let config = ClientConfig {
            notes_base_url: server.url(),
            ..ClientConfig::default()
        };
        NotesSync::new(NotesApiClient::new(&config).unwrap(), options)
    }

    fn note_json(id: &str, title: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": title,
            "content": "body",
            "tags": [],
            "archived": false,
            "created_at": "2026-01-01T00:00:00",
            "updated_at": "2026-01-01T00:00:00"
        })
    }

    fn page_json(notes: &[serde_json::Value], total: u64, total_pages: u32) -> String {
        serde_json::json!({
            "notes": notes,
            "total": total,
            "total_pages": total_pages
        })
        .to_string()
    }

    fn query_page(page: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), page.into()),
            Matcher::UrlEncoded("per_page".into(), "10".into()),
        ])
    }

    #[tokio::test]
    async fn reload_replaces_list_and_totals() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/notes")
            .match_query(query_page("1"))
            .with_body(page_json(&[note_json("n-1", "First")], 25, 3))
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        engine.reload().await.unwrap();

        let snap = engine.snapshot();
        assert_eq!(snap.notes.len(), 1);
        assert_eq!(snap.query.total, 25);
        assert_eq!(snap.query.total_pages, 3);
        assert!(!snap.loading);
        assert_eq!(snap.error, None);
    }

    #[tokio::test]
    async fn set_page_clamps_to_server_reported_bounds() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/notes")
            .match_query(query_page("1"))
            .with_body(page_json(&[note_json("n-1", "First")], 25, 3))
            .create_async()
            .await;
        let page_three = server
            .mock("GET", "/notes")
            .match_query(query_page("3"))
            .with_body(page_json(&[note_json("n-25", "Last")], 25, 3))
            .expect(1)
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        engine.reload().await.unwrap();

        // 25 notes at 10 per page -> 3 pages; page 4 is clamped to 3.
        engine.set_page(4).await.unwrap();
        assert_eq!(engine.snapshot().query.page, 3);
        assert_eq!(engine.snapshot().notes[0].title, "Last");

        // Already on the clamped page: no further request.
        engine.set_page(9).await.unwrap();
        page_three.assert_async().await;

        // Below range clamps back to 1.
        engine.set_page(0).await.unwrap();
        assert_eq!(engine.snapshot().query.page, 1);
    }

    #[tokio::test]
    async fn set_search_trims_truncates_and_resets_page() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/notes")
            .match_query(query_page("1"))
            .with_body(page_json(&[], 25, 3))
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        engine.reload().await.unwrap();
        engine.set_page(2).await.ok();

        let long_term = format!("  {}  ", "x".repeat(250));
        engine.set_search(&long_term).await;

        let snap = engine.snapshot();
        assert_eq!(snap.query.search.chars().count(), 200);
        assert_eq!(snap.query.page, 1);
    }

    #[tokio::test]
    async fn debounced_search_fires_once_with_last_term() {
        let mut server = mockito::Server::new_async().await;
        let partial_r = server
            .mock("GET", "/notes")
            .match_query(Matcher::UrlEncoded("search".into(), "r".into()))
            .expect(0)
            .create_async()
            .await;
        let partial_ru = server
            .mock("GET", "/notes")
            .match_query(Matcher::UrlEncoded("search".into(), "ru".into()))
            .expect(0)
            .create_async()
            .await;
        let full = server
            .mock("GET", "/notes")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("search".into(), "rust".into()),
            ]))
            .with_body(page_json(&[note_json("n-3", "Rust notes")], 1, 1))
            .expect(1)
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        engine.set_search("r").await;
        engine.set_search("ru").await;
        engine.set_search("rust").await;

        sleep(Duration::from_millis(200)).await;

        partial_r.assert_async().await;
        partial_ru.assert_async().await;
        full.assert_async().await;
        let snap = engine.snapshot();
        assert_eq!(snap.query.search, "rust");
        assert_eq!(snap.notes[0].title, "Rust notes");
        assert_eq!(snap.error, None);
    }

    #[tokio::test]
    async fn newer_request_wins_regardless_of_completion_order() {
        let mut server = mockito::Server::new_async().await;
        let stale_body = page_json(&[note_json("n-1", "stale")], 1, 1);
        server
            .mock("GET", "/notes")
            .match_query(Matcher::UrlEncoded("search".into(), "aa".into()))
            .with_chunked_body(move |writer| {
                std::thread::sleep(Duration::from_millis(300));
                writer.write_all(stale_body.as_bytes())
            })
            .create_async()
            .await;
        server
            .mock("GET", "/notes")
            .match_query(Matcher::UrlEncoded("search".into(), "bb".into()))
            .with_body(page_json(&[note_json("n-2", "fresh")], 1, 1))
            .create_async()
            .await;

        // Debounce far in the future so only explicit reloads run here.
        let options = SyncOptions {
            debounce: Duration::from_secs(60),
            ..test_options()
        };
        let engine = engine_for(&server, options);

        engine.set_search("aa").await;
        let slow = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.reload().await })
        };
        sleep(Duration::from_millis(80)).await;

        engine.set_search("bb").await;
        engine.reload().await.unwrap();

        // The older request settles last; its response must be discarded.
        slow.await.unwrap().unwrap();

        let snap = engine.snapshot();
        assert_eq!(snap.notes[0].title, "fresh");
        assert_eq!(snap.query.search, "bb");
        assert!(!snap.loading);
    }

    #[tokio::test]
    async fn failing_list_read_retries_with_backoff_then_stops() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/notes")
            .with_status(500)
            .expect(4)
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        let error = engine.reload().await.unwrap_err();
        assert_eq!(error.classification(), ErrorClass::Server);

        // Retries at ~25ms, ~50ms, ~75ms, then nothing further.
        sleep(Duration::from_millis(500)).await;
        failing.assert_async().await;

        let snap = engine.snapshot();
        let error_state = snap.error.expect("error should stay visible");
        assert_eq!(error_state.retry_count, 3);
        assert_eq!(error_state.class, ErrorClass::Server);
        assert!(!snap.loading);
    }

    #[tokio::test]
    async fn not_found_list_failure_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let missing = server
            .mock("GET", "/notes")
            .with_status(404)
            .with_body(r#"{"detail": "no such page"}"#)
            .expect(1)
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        engine.reload().await.unwrap_err();

        sleep(Duration::from_millis(200)).await;
        missing.assert_async().await;
        assert_eq!(
            engine.snapshot().error.map(|error| error.class),
            Some(ErrorClass::NotFound)
        );
    }

    #[tokio::test]
    async fn success_clears_retry_count_and_error() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/notes")
            .with_status(500)
            .create_async()
            .await;

        // No retries so the error stays put until the next manual reload.
        let options = SyncOptions {
            max_retries: 0,
            ..test_options()
        };
        let engine = engine_for(&server, options);
        engine.reload().await.unwrap_err();
        assert!(engine.snapshot().error.is_some());

        failing.remove_async().await;
        server
            .mock("GET", "/notes")
            .with_body(page_json(&[note_json("n-1", "First")], 1, 1))
            .create_async()
            .await;

        engine.reload().await.unwrap();
        let snap = engine.snapshot();
        assert_eq!(snap.error, None);
        assert_eq!(snap.notes.len(), 1);
    }

    #[tokio::test]
    async fn delete_applies_optimistic_removal_before_reconciling() {
        let mut server = mockito::Server::new_async().await;
        let initial = server
            .mock("GET", "/notes")
            .with_body(page_json(
                &[note_json("n-1", "First"), note_json("n-2", "Second")],
                2,
                1,
            ))
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        engine.reload().await.unwrap();
        assert_eq!(engine.snapshot().notes.len(), 2);
        initial.remove_async().await;

        // Slow delete keeps the remote call in flight while we observe the
        // optimistic state; the reconciling reload then returns server truth.
        server
            .mock("DELETE", "/notes/n-1")
            .with_chunked_body(|_writer| {
                std::thread::sleep(Duration::from_millis(200));
                Ok(())
            })
            .create_async()
            .await;
        server
            .mock("GET", "/notes")
            .with_body(page_json(&[note_json("n-2", "Second")], 1, 1))
            .create_async()
            .await;

        let deleting = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.delete_note(&NoteId::from("n-1")).await })
        };
        sleep(Duration::from_millis(80)).await;

        let optimistic = engine.snapshot();
        assert_eq!(optimistic.notes.len(), 1);
        assert_eq!(optimistic.notes[0].id.as_str(), "n-2");
        assert_eq!(optimistic.query.total, 1);

        deleting.await.unwrap().unwrap();
        let reconciled = engine.snapshot();
        assert_eq!(reconciled.notes.len(), 1);
        assert_eq!(reconciled.query.total, 1);
        assert_eq!(reconciled.error, None);
    }

    #[tokio::test]
    async fn failed_delete_resurfaces_note_after_reconciliation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/notes")
            .with_body(page_json(
                &[note_json("n-1", "First"), note_json("n-2", "Second")],
                2,
                1,
            ))
            .create_async()
            .await;
        server
            .mock("DELETE", "/notes/n-1")
            .with_status(500)
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        engine.reload().await.unwrap();

        let error = engine
            .delete_note(&NoteId::from("n-1"))
            .await
            .unwrap_err();
        assert_eq!(error.classification(), ErrorClass::Server);

        // Reconciliation restored the server's list; the guess was wrong.
        let snap = engine.snapshot();
        assert_eq!(snap.notes.len(), 2);
        assert_eq!(snap.query.total, 2);
    }

    #[tokio::test]
    async fn delete_of_already_missing_note_is_harmless() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/notes")
            .with_body(page_json(&[note_json("n-2", "Second")], 1, 1))
            .create_async()
            .await;
        server
            .mock("DELETE", "/notes/n-9")
            .with_status(404)
            .with_body(r#"{"detail": "Nota no encontrada"}"#)
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        engine.reload().await.unwrap();

        engine.delete_note(&NoteId::from("n-9")).await.unwrap();
        let snap = engine.snapshot();
        assert_eq!(snap.error, None);
        assert_eq!(snap.notes.len(), 1);
    }

    #[tokio::test]
    async fn empty_title_blocks_save_before_any_network_call() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/notes")
            .expect(0)
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        engine.open_create().await;
        engine
            .set_draft(NoteDraft {
                content: "has content".to_string(),
                ..NoteDraft::default()
            })
            .await;

        let error = engine.save().await.unwrap_err();
        assert_eq!(error.field(), Some("title"));
        create.assert_async().await;

        let snap = engine.snapshot();
        assert!(snap.editor.is_open());
        assert_eq!(
            snap.error.and_then(|error| error.field),
            Some("title".to_string())
        );
    }

    #[tokio::test]
    async fn successful_save_closes_editor_and_reloads() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/notes")
            .match_body(Matcher::Json(serde_json::json!({
                "title": "Groceries",
                "content": "milk",
                "tags": ["work", "urgent"]
            })))
            .with_body(note_json("n-5", "Groceries").to_string())
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", "/notes")
            .with_body(page_json(&[note_json("n-5", "Groceries")], 1, 1))
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        engine.open_create().await;
        engine
            .set_draft(NoteDraft {
                title: "Groceries".to_string(),
                content: "milk".to_string(),
                tags: vec![
                    "work".to_string(),
                    "  urgent  ".to_string(),
                    String::new(),
                ],
                archived: false,
            })
            .await;

        let created = engine.save().await.unwrap();
        assert_eq!(created.id.as_str(), "n-5");
        create.assert_async().await;

        let snap = engine.snapshot();
        assert_eq!(snap.editor, EditorState::Closed);
        assert_eq!(snap.notes.len(), 1);
    }

    #[tokio::test]
    async fn updating_missing_note_keeps_editor_open() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/notes")
            .with_body(page_json(&[note_json("n-1", "First")], 1, 1))
            .create_async()
            .await;
        server
            .mock("PUT", "/notes/n-1")
            .with_status(404)
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        engine.reload().await.unwrap();
        engine.open_edit(&NoteId::from("n-1")).await.unwrap();
        engine
            .set_draft(NoteDraft {
                title: "Renamed".to_string(),
                content: "body".to_string(),
                ..NoteDraft::default()
            })
            .await;

        let error = engine.save().await.unwrap_err();
        assert_eq!(
            error.to_string(),
            "Note not found. It may have been deleted."
        );
        assert!(engine.snapshot().editor.is_open());
    }

    #[tokio::test]
    async fn open_edit_prefers_cache_and_falls_back_to_fetch() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/notes")
            .with_body(page_json(&[note_json("n-1", "Cached")], 1, 1))
            .create_async()
            .await;
        let fetch_cached = server
            .mock("GET", "/notes/n-1")
            .expect(0)
            .create_async()
            .await;
        let fetch_missing = server
            .mock("GET", "/notes/n-7")
            .with_body(note_json("n-7", "Fetched").to_string())
            .expect(1)
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        engine.reload().await.unwrap();

        engine.open_edit(&NoteId::from("n-1")).await.unwrap();
        match engine.snapshot().editor {
            EditorState::Editing { draft, .. } => assert_eq!(draft.title, "Cached"),
            other => panic!("expected editing state, got {other:?}"),
        }
        fetch_cached.assert_async().await;

        engine.cancel_edit().await;
        engine.open_edit(&NoteId::from("n-7")).await.unwrap();
        match engine.snapshot().editor {
            EditorState::Editing { draft, .. } => assert_eq!(draft.title, "Fetched"),
            other => panic!("expected editing state, got {other:?}"),
        }
        fetch_missing.assert_async().await;
    }

    #[tokio::test]
    async fn opening_a_second_buffer_is_ignored() {
        let server = mockito::Server::new_async().await;
        let engine = engine_for(&server, test_options());

        engine.open_create().await;
        engine
            .set_draft(NoteDraft {
                title: "kept".to_string(),
                ..NoteDraft::default()
            })
            .await;

        engine.open_create().await;
        match engine.snapshot().editor {
            EditorState::Creating(draft) => assert_eq!(draft.title, "kept"),
            other => panic!("expected creating state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_discards_buffer_without_network() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/notes")
            .expect(0)
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        engine.open_create().await;
        engine.cancel_edit().await;

        assert_eq!(engine.snapshot().editor, EditorState::Closed);
        create.assert_async().await;
    }

    #[tokio::test]
    async fn error_auto_clears_after_display_timeout() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/notes")
            .with_status(404)
            .create_async()
            .await;

        let options = SyncOptions {
            error_ttl: Duration::from_millis(60),
            ..test_options()
        };
        let engine = engine_for(&server, options);
        engine.reload().await.unwrap_err();
        assert!(engine.snapshot().error.is_some());

        sleep(Duration::from_millis(200)).await;
        assert_eq!(engine.snapshot().error, None);
    }

    #[tokio::test]
    async fn dismiss_clears_error_immediately() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/notes")
            .with_status(404)
            .create_async()
            .await;

        let engine = engine_for(&server, test_options());
        engine.reload().await.unwrap_err();
        assert!(engine.snapshot().error.is_some());

        engine.dismiss_error().await;
        assert_eq!(engine.snapshot().error, None);
    }

    #[tokio::test]
    async fn subscribers_observe_published_snapshots() {
        let server = mockito::Server::new_async().await;
        let engine = engine_for(&server, test_options());
        let mut updates = engine.subscribe();

        engine.open_create().await;

        updates.changed().await.unwrap();
        assert!(updates.borrow_and_update().editor.is_open());
    }
}
