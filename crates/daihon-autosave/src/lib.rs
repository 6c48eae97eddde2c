//! Fire-and-forget persistence for Daihon scripts.
//!
//! The editor's in-memory document is always authoritative. This crate
//! only pushes snapshots outward: [`Autosave::spawn`] starts an actor that
//! writes the newest snapshot through a [`Persist`] backend and returns an
//! [`AutosaveHandle`] to subscribe to the editor.
//!
//! ```no_run
//! # async fn demo() {
//! use daihon_autosave::{Autosave, JsonFilePersist};
//! use daihon_doc::{EditorConfig, ScriptEditor};
//!
//! let (handle, _task) = Autosave::spawn(JsonFilePersist::new("script.json"));
//! let mut editor = ScriptEditor::new(EditorConfig::default());
//! editor.subscribe(handle.clone());
//! // ... edits ...
//! handle.flush().await;
//! # }
//! ```

mod actor;
mod persist;

pub use actor::{Autosave, AutosaveHandle, SaveStatus};
pub use persist::{JsonFilePersist, Persist, PersistError};
