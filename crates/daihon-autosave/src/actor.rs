//! Autosave actor.
//!
//! ```text
//!   AutosaveHandle (EventSink)    mpsc     Autosave (tokio task)
//!   ┌──────────────────────┐  ────────▶  ┌─────────────────────────┐
//!   │ emit(Changed(..))    │             │ coalesce to newest      │
//!   │ flush()              │  ◀────────  │ Persist::save(records)  │
//!   └──────────────────────┘   oneshot   └─────────────────────────┘
//! ```
//!
//! Sending never blocks the editor. Only the newest queued snapshot is
//! written; older ones are superseded. A failed save is logged and shows
//! up in [`SaveStatus`], but the editor's state is never touched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use daihon_doc::{EditorEvent, EventSink};
use daihon_types::{Block, BlockRecord};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::persist::Persist;

/// Outcome of the most recent save attempt.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SaveStatus {
    /// Nothing saved yet.
    #[default]
    Idle,
    /// Snapshot `seq` is on the backend.
    Saved { seq: u64 },
    /// Saving snapshot `seq` failed. Local edits are kept.
    Failed { seq: u64, error: String },
}

// ============================================================================
// Commands (internal)
// ============================================================================

enum Command {
    Snapshot { seq: u64, records: Vec<BlockRecord> },
    Flush { reply: oneshot::Sender<SaveStatus> },
}

// ============================================================================
// AutosaveHandle
// ============================================================================

/// Handle to a running autosave actor.
///
/// Subscribe it to a `ScriptEditor` to save on every change. Dropping the
/// last handle stops the actor after it finishes what is queued.
#[derive(Clone)]
pub struct AutosaveHandle {
    tx: mpsc::UnboundedSender<Command>,
    seq: Arc<AtomicU64>,
    status: Arc<Mutex<SaveStatus>>,
}

impl AutosaveHandle {
    /// Queue a snapshot. Returns its sequence number.
    pub fn queue(&self, records: Vec<BlockRecord>) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        if self.tx.send(Command::Snapshot { seq, records }).is_err() {
            tracing::warn!(seq, "autosave actor is gone; snapshot dropped");
        }
        seq
    }

    /// Wait until everything queued so far has been attempted.
    pub async fn flush(&self) -> SaveStatus {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Flush { reply }).is_err() {
            return self.status();
        }
        rx.await.unwrap_or_else(|_| self.status())
    }

    /// Latest save status.
    pub fn status(&self) -> SaveStatus {
        self.status.lock().clone()
    }
}

impl EventSink for AutosaveHandle {
    fn emit(&mut self, event: &EditorEvent) {
        if let EditorEvent::Changed(blocks) = event {
            self.queue(blocks.iter().map(Block::to_record).collect());
        }
    }
}

// ============================================================================
// Autosave (the actor)
// ============================================================================

/// Actor that owns a [`Persist`] backend.
pub struct Autosave<P> {
    persist: P,
    status: Arc<Mutex<SaveStatus>>,
}

impl<P: Persist> Autosave<P> {
    /// Spawn the actor on the current tokio runtime.
    pub fn spawn(persist: P) -> (AutosaveHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let status = Arc::new(Mutex::new(SaveStatus::Idle));
        let actor = Autosave {
            persist,
            status: status.clone(),
        };
        let task = tokio::spawn(actor.run(rx));
        let handle = AutosaveHandle {
            tx,
            seq: Arc::new(AtomicU64::new(0)),
            status,
        };
        (handle, task)
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(first) = rx.recv().await {
            let mut newest = None;
            let mut flushes = Vec::new();
            let mut superseded = 0usize;

            let mut next = Some(first);
            while let Some(cmd) = next {
                match cmd {
                    Command::Snapshot { seq, records } => {
                        if newest.replace((seq, records)).is_some() {
                            superseded += 1;
                        }
                    }
                    Command::Flush { reply } => flushes.push(reply),
                }
                next = rx.try_recv().ok();
            }

            if superseded > 0 {
                tracing::trace!(superseded, "coalesced autosave snapshots");
            }
            if let Some((seq, records)) = newest {
                self.save(seq, &records).await;
            }
            for reply in flushes {
                let _ = reply.send(self.status.lock().clone());
            }
        }
        tracing::debug!("autosave shutting down: channel closed");
    }

    async fn save(&self, seq: u64, records: &[BlockRecord]) {
        let status = match self.persist.save(records).await {
            Ok(()) => {
                tracing::info!(seq, blocks = records.len(), "autosaved script");
                SaveStatus::Saved { seq }
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "autosave failed; keeping local edits");
                SaveStatus::Failed {
                    seq,
                    error: e.to_string(),
                }
            }
        };
        *self.status.lock() = status;
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use daihon_doc::{EditorConfig, ScriptEditor};
    use daihon_types::BlockId;

    use super::*;
    use crate::persist::{JsonFilePersist, PersistError};

    /// Records every snapshot it is asked to save.
    #[derive(Clone, Default)]
    struct MemoryPersist {
        saves: Arc<Mutex<Vec<Vec<BlockRecord>>>>,
    }

    #[async_trait]
    impl Persist for MemoryPersist {
        async fn save(&self, records: &[BlockRecord]) -> Result<(), PersistError> {
            self.saves.lock().push(records.to_vec());
            Ok(())
        }
    }

    struct FailingPersist;

    #[async_trait]
    impl Persist for FailingPersist {
        async fn save(&self, _records: &[BlockRecord]) -> Result<(), PersistError> {
            Err(PersistError::Backend("quota exceeded".into()))
        }
    }

    fn editor() -> ScriptEditor {
        let (editor, _) = ScriptEditor::load_json(
            r#"[{"id": "a", "type": "hook", "content": "Hi", "order": 0},
                {"id": "b", "type": "body", "content": "There", "order": 1}]"#,
            EditorConfig::default(),
        )
        .unwrap();
        editor
    }

    #[tokio::test]
    async fn test_saves_on_change() {
        let persist = MemoryPersist::default();
        let (handle, _task) = Autosave::spawn(persist.clone());
        let mut editor = editor();
        editor.subscribe(handle.clone());

        editor.update_content(&BlockId::from("b"), "Everyone").unwrap();
        assert_eq!(handle.flush().await, SaveStatus::Saved { seq: 1 });

        let saves = persist.saves.lock();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0][1].content.as_deref(), Some("Everyone"));
    }

    #[tokio::test]
    async fn test_burst_is_coalesced_to_newest() {
        let persist = MemoryPersist::default();
        let (handle, _task) = Autosave::spawn(persist.clone());
        let mut editor = editor();
        editor.subscribe(handle.clone());

        let b = BlockId::from("b");
        for text in ["one", "one two", "one two three"] {
            editor.update_content(&b, text).unwrap();
        }
        assert_eq!(handle.flush().await, SaveStatus::Saved { seq: 3 });

        let saves = persist.saves.lock();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0][1].content.as_deref(), Some("one two three"));
    }

    #[tokio::test]
    async fn test_failure_keeps_local_edits() {
        let (handle, _task) = Autosave::spawn(FailingPersist);
        let mut editor = editor();
        editor.subscribe(handle.clone());

        editor.update_content(&BlockId::from("a"), "Hello").unwrap();
        let status = handle.flush().await;
        assert!(matches!(status, SaveStatus::Failed { seq: 1, .. }));
        assert_eq!(editor.blocks()[0].content, "Hello");
        assert_eq!(handle.status(), status);
    }

    #[tokio::test]
    async fn test_non_change_events_are_ignored() {
        let persist = MemoryPersist::default();
        let (handle, _task) = Autosave::spawn(persist.clone());
        let mut editor = editor();
        editor.subscribe(handle.clone());

        editor.seek(1.0);
        editor.select(&BlockId::from("a")).unwrap();
        assert_eq!(handle.flush().await, SaveStatus::Idle);
        assert!(persist.saves.lock().is_empty());
    }

    #[tokio::test]
    async fn test_dropping_handles_stops_actor() {
        let (handle, task) = Autosave::spawn(MemoryPersist::default());
        let mut editor = editor();
        editor.subscribe(handle);
        drop(editor);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_autosave_to_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.json");
        let (handle, _task) = Autosave::spawn(JsonFilePersist::new(&path));
        let mut editor = editor();
        editor.subscribe(handle.clone());

        editor.split_at(&BlockId::from("b"), 2).unwrap();
        handle.flush().await;

        let text = std::fs::read_to_string(&path).unwrap();
        let (reloaded, report) = ScriptEditor::load_json(&text, EditorConfig::default()).unwrap();
        assert!(report.skipped.is_empty());
        assert_eq!(reloaded.blocks(), editor.blocks());
    }
}
