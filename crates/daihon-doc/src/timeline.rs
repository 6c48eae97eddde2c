//! Time-indexed projection of the block sequence.
//!
//! [`TimelineIndex`] is pure derived data: spans built by prefix-summing
//! block durations in document order, tagged with the store version they
//! came from. [`Timeline`] adds the view state on top (playhead, zoom,
//! scroll). Zoom and scroll only touch the pixel mapping; time values are
//! owned by the store and never change here.

use std::collections::HashMap;

use daihon_types::Timing;

use crate::config::TimelineConfig;
use crate::store::BlockStore;
use crate::BlockId;

/// One block's slot on the timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    pub id: BlockId,
    pub timing: Timing,
}

/// Derived time index over a store snapshot.
#[derive(Clone, Debug, Default)]
pub struct TimelineIndex {
    spans: Vec<Span>,
    positions: HashMap<BlockId, usize>,
    total: f64,
    built_from: Option<u64>,
}

impl TimelineIndex {
    pub fn build(store: &BlockStore) -> Self {
        let mut spans = Vec::with_capacity(store.len());
        let mut positions = HashMap::with_capacity(store.len());
        let mut t = 0.0;
        for (i, block) in store.blocks().iter().enumerate() {
            let end = t + block.duration;
            spans.push(Span {
                id: block.id.clone(),
                timing: Timing::new(t, end),
            });
            positions.insert(block.id.clone(), i);
            t = end;
        }
        Self {
            spans,
            positions,
            total: t,
            built_from: Some(store.version()),
        }
    }

    /// True when built from the store's current version.
    pub fn is_current(&self, store: &BlockStore) -> bool {
        self.built_from == Some(store.version())
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Block whose `[start, end)` contains `t`.
    ///
    /// `t == total` resolves to the last block. `None` outside `[0, total]`.
    pub fn time_to_block(&self, t: f64) -> Option<&BlockId> {
        if !(0.0..=self.total).contains(&t) {
            return None;
        }
        if t == self.total {
            return self.spans.last().map(|s| &s.id);
        }
        let i = self.spans.partition_point(|s| s.timing.end <= t);
        self.spans.get(i).map(|s| &s.id)
    }

    pub fn block_to_time(&self, id: &BlockId) -> Option<Timing> {
        self.positions.get(id).map(|&i| self.spans[i].timing)
    }
}

/// Timeline view: derived index plus playhead and pixel mapping.
#[derive(Clone, Debug)]
pub struct Timeline {
    index: TimelineIndex,
    config: TimelineConfig,
    current_time: f64,
    zoom: f64,
    /// Time at the left edge of the viewport, in seconds.
    viewport_start: f64,
}

impl Timeline {
    /// An invalid `config` is replaced by the defaults.
    pub fn new(store: &BlockStore, config: TimelineConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!(error = %e, "using default timeline config");
                TimelineConfig::default()
            }
        };
        Self {
            index: TimelineIndex::build(store),
            config,
            current_time: 0.0,
            zoom: 1.0,
            viewport_start: 0.0,
        }
    }

    pub fn index(&self) -> &TimelineIndex {
        &self.index
    }

    pub fn is_current(&self, store: &BlockStore) -> bool {
        self.index.is_current(store)
    }

    /// Rebuild the index from `store`, clamping the playhead into the new
    /// total.
    pub fn rebuild(&mut self, store: &BlockStore) {
        self.index = TimelineIndex::build(store);
        self.current_time = self.current_time.clamp(0.0, self.index.total());
        tracing::trace!(version = store.version(), total = self.index.total(), "rebuilt timeline");
    }

    /// Rebuild only if stale.
    pub fn sync(&mut self, store: &BlockStore) {
        if !self.is_current(store) {
            self.rebuild(store);
        }
    }

    // =========================================================================
    // Time queries
    // =========================================================================

    pub fn total(&self) -> f64 {
        self.index.total()
    }

    pub fn time_to_block(&self, t: f64) -> Option<&BlockId> {
        self.index.time_to_block(t)
    }

    pub fn block_to_time(&self, id: &BlockId) -> Option<Timing> {
        self.index.block_to_time(id)
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Block under the playhead.
    pub fn current_block(&self) -> Option<&BlockId> {
        self.index.time_to_block(self.current_time)
    }

    /// Move the playhead, clamped to `[0, total]`. Returns the clamped time.
    pub fn seek(&mut self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t };
        self.current_time = t.clamp(0.0, self.index.total());
        self.current_time
    }

    /// Playback tick: move the playhead and report the block under it.
    pub fn advance_playhead(&mut self, t: f64) -> Option<&BlockId> {
        self.seek(t);
        self.current_block()
    }

    // =========================================================================
    // Pixel mapping
    // =========================================================================

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pixels_per_second(&self) -> f64 {
        self.config.pixels_per_second * self.zoom
    }

    /// Set the zoom level, clamped to the configured range.
    ///
    /// The playhead keeps its screen x across the change: the viewport
    /// shifts so that `time_to_x(current_time)` is the same before and
    /// after. Returns the applied level.
    pub fn set_zoom(&mut self, level: f64) -> f64 {
        if level.is_nan() {
            return self.zoom;
        }
        let anchor_x = self.time_to_x(self.current_time);
        self.zoom = level.clamp(self.config.min_zoom, self.config.max_zoom);
        self.viewport_start = self.current_time - anchor_x / self.pixels_per_second();
        self.zoom
    }

    pub fn viewport_start(&self) -> f64 {
        self.viewport_start
    }

    /// Scroll so that `t` sits at the left edge.
    pub fn scroll_to(&mut self, t: f64) {
        self.viewport_start = t.max(0.0);
    }

    /// Scroll by a pixel delta.
    pub fn scroll_by(&mut self, dx: f64) {
        self.scroll_to(self.viewport_start + dx / self.pixels_per_second());
    }

    /// Time (seconds) to viewport x (pixels).
    pub fn time_to_x(&self, t: f64) -> f64 {
        (t - self.viewport_start) * self.pixels_per_second()
    }

    /// Viewport x (pixels) to time (seconds).
    pub fn x_to_time(&self, x: f64) -> f64 {
        self.viewport_start + x / self.pixels_per_second()
    }

    /// Block drawn under viewport x, for click-to-select.
    pub fn block_at_x(&self, x: f64) -> Option<&BlockId> {
        self.index.time_to_block(self.x_to_time(x))
    }

    /// Left edge and width of a block in viewport pixels.
    pub fn block_rect(&self, id: &BlockId) -> Option<(f64, f64)> {
        let timing = self.index.block_to_time(id)?;
        Some((self.time_to_x(timing.start), timing.duration() * self.pixels_per_second()))
    }
}
