//! Editor facade: one owned document plus the views derived from it.
//!
//! [`ScriptEditor`] is the only thing a front-end talks to. It owns the
//! [`BlockStore`], the [`NavigationController`] and the [`Timeline`], and
//! after every committed mutation it rebuilds the timeline before returning,
//! so no query can observe a stale index. Subscribers get the new block
//! array and a duration summary through [`EventSink`]s.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use daihon_types::{Block, BlockKind, BlockRecord, EffectValue};

use crate::config::EditorConfig;
use crate::estimate::DurationEstimator;
use crate::load::LoadReport;
use crate::nav::{Focus, Intent, NavigationController, Transition};
use crate::reorder::DragEnd;
use crate::store::BlockStore;
use crate::timeline::Timeline;
use crate::{BlockId, Result};

/// Totals for display ("12 blocks, 48.5s").
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DurationSummary {
    pub block_count: usize,
    pub total_seconds: f64,
    /// Blocks whose duration came from synthesis rather than the estimate.
    pub measured_blocks: usize,
}

impl DurationSummary {
    pub fn of(store: &BlockStore) -> Self {
        Self {
            block_count: store.len(),
            total_seconds: store.total_duration(),
            measured_blocks: store.blocks().iter().filter(|b| b.is_measured()).count(),
        }
    }
}

impl std::fmt::Display for DurationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} blocks, {:.1}s", self.block_count, self.total_seconds)?;
        if self.measured_blocks > 0 {
            write!(f, " ({} measured)", self.measured_blocks)?;
        }
        Ok(())
    }
}

/// Outbound notifications.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    /// The block sequence changed; carries the full new array.
    Changed(Vec<Block>),
    /// Duration totals after a change.
    Summary(DurationSummary),
    /// A different block is now selected.
    SelectionChanged(BlockId),
    /// The selected block was removed; nothing is selected.
    SelectionCleared,
    /// User-initiated seek (seconds, already clamped).
    Seeked(f64),
}

/// Receiver of editor events.
pub trait EventSink: Send {
    fn emit(&mut self, event: &EditorEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&EditorEvent) + Send,
{
    fn emit(&mut self, event: &EditorEvent) {
        self(event)
    }
}

/// The script editor.
pub struct ScriptEditor {
    store: BlockStore,
    nav: NavigationController,
    timeline: Timeline,
    selection: Option<BlockId>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl ScriptEditor {
    /// Editor over a fresh single-block script.
    pub fn new(config: EditorConfig) -> Self {
        let store = BlockStore::new(DurationEstimator::new(config.estimator));
        Self::from_store(store, config)
    }

    pub fn from_store(store: BlockStore, config: EditorConfig) -> Self {
        let timeline = Timeline::new(&store, config.timeline);
        Self {
            store,
            nav: NavigationController::new(),
            timeline,
            selection: None,
            sinks: Vec::new(),
        }
    }

    /// Load wire records.
    pub fn load(records: Vec<BlockRecord>, config: EditorConfig) -> (Self, LoadReport) {
        let (store, report) =
            BlockStore::from_records(records, DurationEstimator::new(config.estimator));
        (Self::from_store(store, config), report)
    }

    /// Load a JSON record array.
    pub fn load_json(text: &str, config: EditorConfig) -> serde_json::Result<(Self, LoadReport)> {
        let (store, report) = BlockStore::from_json(text, DurationEstimator::new(config.estimator))?;
        Ok((Self::from_store(store, config), report))
    }

    pub fn subscribe(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn blocks(&self) -> &[Block] {
        self.store.blocks()
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn focus(&self) -> Option<&Focus> {
        self.nav.focus()
    }

    pub fn selection(&self) -> Option<&BlockId> {
        self.selection.as_ref()
    }

    pub fn summary(&self) -> DurationSummary {
        DurationSummary::of(&self.store)
    }

    // =========================================================================
    // Focus & intents
    // =========================================================================

    /// Put the cursor in a block. Selection follows.
    pub fn focus_block(&mut self, id: &BlockId, offset: usize) -> Result<()> {
        let result = self.nav.set_focus(&self.store, id, offset);
        if result.is_ok() {
            self.follow_focus();
        }
        self.guard("focus", result)
    }

    /// Apply a keyboard intent at the current focus.
    pub fn dispatch(&mut self, intent: Intent) -> Result<Transition> {
        let result = self.nav.apply(&mut self.store, intent);
        let result = self.guard("dispatch", result);
        if matches!(result, Ok(Transition::Moved | Transition::Edited)) {
            self.follow_focus();
        }
        result
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn update_content(&mut self, id: &BlockId, content: impl Into<String>) -> Result<()> {
        let result = self.store.update_content(id, content);
        self.guard("update_content", result)
    }

    pub fn split_at(&mut self, id: &BlockId, offset: usize) -> Result<BlockId> {
        let result = self.store.split_at(id, offset);
        self.guard("split", result)
    }

    pub fn merge_left(&mut self, id: &BlockId) -> Result<usize> {
        let result = self.store.merge_left(id);
        self.guard("merge", result)
    }

    pub fn delete_block(&mut self, id: &BlockId) -> Result<usize> {
        let result = self.store.delete_block(id);
        self.guard("delete", result)
    }

    pub fn insert_block(
        &mut self,
        after: Option<&BlockId>,
        kind: BlockKind,
        content: impl Into<String>,
    ) -> Result<BlockId> {
        let result = self.store.insert_block(after, kind, content);
        self.guard("insert", result)
    }

    pub fn reorder(&mut self, source: usize, destination: usize) -> Result<bool> {
        let result = self.store.reorder(source, destination);
        self.guard("reorder", result)
    }

    pub fn apply_drag(&mut self, drag: DragEnd) -> Result<bool> {
        let result = self.store.apply_drag(drag);
        self.guard("drag", result)
    }

    pub fn set_measured_duration(&mut self, id: &BlockId, seconds: f64) -> Result<()> {
        let result = self.store.set_measured_duration(id, seconds);
        self.guard("set_measured_duration", result)
    }

    pub fn set_effect(
        &mut self,
        id: &BlockId,
        name: impl Into<String>,
        value: EffectValue,
    ) -> Result<()> {
        let result = self.store.set_effect(id, name, value);
        self.guard("set_effect", result)
    }

    pub fn clear_effect(&mut self, id: &BlockId, name: &str) -> Result<Option<EffectValue>> {
        let result = self.store.clear_effect(id, name);
        self.guard("clear_effect", result)
    }

    // =========================================================================
    // Timeline
    // =========================================================================

    /// Select a block (highlight in both views).
    pub fn select(&mut self, id: &BlockId) -> Result<()> {
        let result = self.store.require(id).map(|_| ());
        if result.is_ok() {
            self.set_selection(Some(id.clone()));
        }
        self.guard("select", result)
    }

    /// Click on the timeline at viewport x: select the block there and seek
    /// to the clicked time.
    pub fn click_timeline(&mut self, x: f64) -> Option<BlockId> {
        let t = self.timeline.x_to_time(x);
        let hit = self.timeline.time_to_block(t).cloned()?;
        self.set_selection(Some(hit.clone()));
        self.seek(t);
        Some(hit)
    }

    /// User seek. Returns the clamped time.
    pub fn seek(&mut self, t: f64) -> f64 {
        let t = self.timeline.seek(t);
        self.emit(EditorEvent::Seeked(t));
        t
    }

    /// Playback tick from the player. Never emits a seek and never touches
    /// the store.
    pub fn advance_playhead(&mut self, t: f64) -> Option<&BlockId> {
        self.timeline.advance_playhead(t)
    }

    pub fn set_zoom(&mut self, level: f64) -> f64 {
        self.timeline.set_zoom(level)
    }

    pub fn scroll_timeline_by(&mut self, dx: f64) {
        self.timeline.scroll_by(dx);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Log rejections; publish accepted mutations.
    fn guard<T>(&mut self, op: &'static str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) if !self.timeline.is_current(&self.store) => self.committed(),
            Ok(_) => {}
            Err(e) => tracing::warn!(op, error = %e, "edit rejected"),
        }
        result
    }

    fn committed(&mut self) {
        self.timeline.rebuild(&self.store);
        self.nav.revalidate(&self.store);
        self.emit(EditorEvent::Changed(self.store.blocks().to_vec()));
        self.emit(EditorEvent::Summary(self.summary()));
        if self.selection.as_ref().is_some_and(|s| self.store.get(s).is_none()) {
            self.set_selection(None);
        }
    }

    fn follow_focus(&mut self) {
        let focused = self.nav.focus().map(|f| f.block_id.clone());
        if focused.is_some() {
            self.set_selection(focused);
        }
    }

    fn set_selection(&mut self, id: Option<BlockId>) {
        if self.selection == id {
            return;
        }
        self.selection = id.clone();
        match id {
            Some(id) => self.emit(EditorEvent::SelectionChanged(id)),
            None => self.emit(EditorEvent::SelectionCleared),
        }
    }

    fn emit(&mut self, event: EditorEvent) {
        for sink in &mut self.sinks {
            sink.emit(&event);
        }
    }
}

/// Editor shared across tasks. The lock serializes handlers so two
/// mutations never interleave.
#[derive(Clone)]
pub struct SharedEditor(Arc<Mutex<ScriptEditor>>);

impl SharedEditor {
    pub fn new(editor: ScriptEditor) -> Self {
        Self(Arc::new(Mutex::new(editor)))
    }

    /// Run `f` with exclusive access to the editor.
    pub fn with<R>(&self, f: impl FnOnce(&mut ScriptEditor) -> R) -> R {
        let mut editor = self.0.lock();
        f(&mut editor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{id, store_of};
    use crate::EditError;

    fn editor() -> (ScriptEditor, Arc<Mutex<Vec<EditorEvent>>>) {
        let store = store_of(&[
            ("a", BlockKind::Hook, "one two"),
            ("b", BlockKind::Body, "three"),
            ("c", BlockKind::Cta, "four five six"),
        ]);
        let mut editor = ScriptEditor::from_store(store, EditorConfig::default());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        editor.subscribe(move |e: &EditorEvent| sink.lock().push(e.clone()));
        (editor, events)
    }

    #[test]
    fn test_mutation_emits_changed_then_summary() {
        let (mut editor, events) = editor();
        editor.split_at(&id("a"), 3).unwrap();

        let events = events.lock();
        assert_eq!(events.len(), 2);
        match &events[0] {
            EditorEvent::Changed(blocks) => assert_eq!(blocks.len(), 4),
            other => panic!("expected Changed, got {other:?}"),
        }
        assert_eq!(
            events[1],
            EditorEvent::Summary(DurationSummary {
                block_count: 4,
                total_seconds: 3.0,
                measured_blocks: 0,
            })
        );
    }

    #[test]
    fn test_timeline_is_never_stale_after_mutation() {
        let (mut editor, _) = editor();
        editor.update_content(&id("b"), "three and more").unwrap();
        assert!(editor.timeline().is_current(editor.store()));
        editor.reorder(2, 0).unwrap();
        assert!(editor.timeline().is_current(editor.store()));
        assert_eq!(editor.timeline().time_to_block(0.0), Some(&id("c")));
    }

    #[test]
    fn test_rejected_edit_emits_nothing() {
        let (mut editor, events) = editor();
        assert_eq!(editor.merge_left(&id("a")), Err(EditError::NoPredecessor(id("a"))));
        assert!(editor.reorder(1, 1).is_ok());
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_dispatch_split_moves_selection() {
        let (mut editor, events) = editor();
        editor.focus_block(&id("a"), 3).unwrap();
        assert_eq!(editor.selection(), Some(&id("a")));

        editor.dispatch(Intent::Split).unwrap();
        let tail = editor.focus().unwrap().block_id.clone();
        assert_eq!(editor.selection(), Some(&tail));
        assert_eq!(editor.blocks().len(), 4);

        let events = events.lock();
        assert_eq!(events[0], EditorEvent::SelectionChanged(id("a")));
        assert_eq!(events.last(), Some(&EditorEvent::SelectionChanged(tail)));
    }

    #[test]
    fn test_deleting_selected_block_clears_selection() {
        let (mut editor, events) = editor();
        editor.select(&id("c")).unwrap();
        editor.delete_block(&id("c")).unwrap();
        assert_eq!(editor.selection(), None);
        assert_eq!(events.lock().last(), Some(&EditorEvent::SelectionCleared));
    }

    #[test]
    fn test_merging_selected_block_announces_clear() {
        let (mut editor, events) = editor();
        editor.select(&id("b")).unwrap();
        events.lock().clear();
        editor.merge_left(&id("b")).unwrap();
        assert_eq!(editor.selection(), None);

        let events = events.lock();
        assert!(matches!(events[0], EditorEvent::Changed(_)));
        assert!(matches!(events[1], EditorEvent::Summary(_)));
        assert_eq!(events[2], EditorEvent::SelectionCleared);
    }

    #[test]
    fn test_delete_intent_reselects_landing_block() {
        let (mut editor, events) = editor();
        editor.focus_block(&id("b"), 0).unwrap();
        events.lock().clear();
        editor.dispatch(Intent::DeleteBlock).unwrap();
        assert_eq!(editor.selection(), Some(&id("c")));
        assert_eq!(
            events.lock()[2..].to_vec(),
            vec![EditorEvent::SelectionCleared, EditorEvent::SelectionChanged(id("c"))]
        );
    }

    #[test]
    fn test_reorder_keeps_selection_on_moved_block() {
        let (mut editor, _) = editor();
        editor.focus_block(&id("a"), 2).unwrap();
        assert!(editor.reorder(0, 2).unwrap());
        assert_eq!(editor.blocks()[2].id, id("a"));
        assert_eq!(editor.selection(), Some(&id("a")));
        assert_eq!(editor.focus(), Some(&Focus::new(id("a"), 2)));
    }

    #[test]
    fn test_clearing_absent_effect_is_silent() {
        let (mut editor, events) = editor();
        assert_eq!(editor.clear_effect(&id("a"), "fade").unwrap(), None);
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_click_timeline_selects_and_seeks() {
        let (mut editor, events) = editor();
        assert_eq!(editor.click_timeline(120.0), Some(id("b")));
        assert_eq!(editor.timeline().current_time(), 1.2);
        assert_eq!(
            *events.lock(),
            vec![EditorEvent::SelectionChanged(id("b")), EditorEvent::Seeked(1.2)]
        );
        assert_eq!(editor.click_timeline(10_000.0), None);
    }

    #[test]
    fn test_playback_tick_is_silent_and_read_only() {
        let (mut editor, events) = editor();
        let version = editor.store().version();
        assert_eq!(editor.advance_playhead(2.0), Some(&id("c")));
        assert_eq!(editor.store().version(), version);
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_seek_emits_clamped_time() {
        let (mut editor, events) = editor();
        assert_eq!(editor.seek(42.0), 3.0);
        assert_eq!(*events.lock(), vec![EditorEvent::Seeked(3.0)]);
    }

    #[test]
    fn test_zoom_leaves_times_alone() {
        let (mut editor, _) = editor();
        let before = editor.timeline().block_to_time(&id("b"));
        editor.set_zoom(4.0);
        assert_eq!(editor.timeline().block_to_time(&id("b")), before);
    }

    #[test]
    fn test_summary_counts_measured_blocks() {
        let (mut editor, _) = editor();
        editor.set_measured_duration(&id("b"), 0.8).unwrap();
        let summary = editor.summary();
        assert_eq!(summary.measured_blocks, 1);
        assert!((summary.total_seconds - 3.3).abs() < 1e-9);
        assert_eq!(summary.to_string(), "3 blocks, 3.3s (1 measured)");
    }

    #[test]
    fn test_shared_editor_serializes_access() {
        let shared = SharedEditor::new(ScriptEditor::new(EditorConfig::default()));
        let first = shared.with(|e| e.blocks()[0].id.clone());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                let first = first.clone();
                std::thread::spawn(move || {
                    shared.with(|e| e.insert_block(Some(&first), BlockKind::Body, format!("w{i}")))
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        shared.with(|e| {
            assert_eq!(e.blocks().len(), 5);
            assert!(e.store().is_consistent());
        });
    }
}
