//! memo-core - Core library for memo
//!
//! This crate contains the shared models, the remote API clients, and the
//! notes synchronization engine used by the memo interfaces.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pokedex;
pub mod sync;
pub mod util;

pub use api::{HealthStatus, NotesApiClient, NotesPage};
pub use config::ClientConfig;
pub use error::{Error, ErrorClass, Result};
pub use models::{Note, NoteDraft, NoteId};
pub use sync::{EditorState, NotesSync, Snapshot, SyncOptions};
