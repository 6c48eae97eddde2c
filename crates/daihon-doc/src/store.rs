//! Block store: the owned, ordered block sequence.
//!
//! The store is the single authority over the script. Every mutation
//! validates first and touches the sequence only once validation passes,
//! then finishes with [`BlockStore::commit`], which re-derives `order` and
//! `timing` for the whole sequence and bumps the version. A rejected
//! mutation therefore leaves the store exactly as it was.
//!
//! Invariants held after every public call:
//! - `order` is the contiguous range `0..n` matching position
//! - `timing` is a gapless prefix sum of `duration`
//! - at least one block exists
//! - ids are unique and never reassigned

use std::collections::HashSet;

use daihon_types::{
    Block, BlockId, BlockKind, BlockRecord, DurationSource, EffectValue, Timing,
};

use crate::estimate::DurationEstimator;
use crate::load::{self, LoadReport};
use crate::{EditError, Result, ValidationError};

/// Ordered collection of script blocks.
#[derive(Clone, Debug)]
pub struct BlockStore {
    /// Blocks in document order.
    pub(crate) blocks: Vec<Block>,

    /// Heuristic used for every content change.
    pub(crate) estimator: DurationEstimator,

    /// Store version (bumped on any committed mutation).
    version: u64,
}

impl BlockStore {
    /// Create a store holding a single empty body block.
    pub fn new(estimator: DurationEstimator) -> Self {
        Self::from_blocks(Vec::new(), estimator)
    }

    /// Admit blocks (already validated and ordered), seeding an empty body
    /// block when there are none.
    pub(crate) fn from_blocks(mut blocks: Vec<Block>, estimator: DurationEstimator) -> Self {
        if blocks.is_empty() {
            blocks.push(Block::new(BlockId::generate(), BlockKind::Body, ""));
        }
        for block in &mut blocks {
            block.duration = estimator.estimate(&block.content);
            block.duration_source = DurationSource::Estimated;
        }
        let mut store = Self {
            blocks,
            estimator,
            version: 0,
        };
        store.commit();
        store
    }

    /// Load from wire records. Malformed records are skipped and reported.
    pub fn from_records(records: Vec<BlockRecord>, estimator: DurationEstimator) -> (Self, LoadReport) {
        Self::from_entries(records.into_iter().map(Ok).collect(), estimator)
    }

    /// Load from a JSON array of records.
    ///
    /// Fails only when the text is not a JSON array; bad entries inside the
    /// array are skipped and reported.
    pub fn from_json(text: &str, estimator: DurationEstimator) -> serde_json::Result<(Self, LoadReport)> {
        let entries = load::parse_records(text)?;
        Ok(Self::from_entries(entries, estimator))
    }

    fn from_entries(
        entries: Vec<std::result::Result<BlockRecord, ValidationError>>,
        estimator: DurationEstimator,
    ) -> (Self, LoadReport) {
        let (blocks, mut report) = load::admit(entries);
        report.seeded = blocks.is_empty();
        let store = Self::from_blocks(blocks, estimator);
        tracing::info!(
            loaded = report.loaded,
            skipped = report.skipped_count(),
            seeded = report.seeded,
            "loaded script"
        );
        (store, report)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Blocks in document order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks (never zero).
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Current version.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn estimator(&self) -> &DurationEstimator {
        &self.estimator
    }

    /// Look up a block by ID.
    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    /// Position of a block in the sequence.
    pub fn index_of(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| &b.id == id)
    }

    /// Sum of all durations.
    pub fn total_duration(&self) -> f64 {
        self.blocks.last().map(|b| b.timing.end).unwrap_or(0.0)
    }

    /// Full script text (blocks joined by blank lines).
    pub fn full_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Wire records for persistence, in document order.
    pub fn records(&self) -> Vec<BlockRecord> {
        self.blocks.iter().map(Block::to_record).collect()
    }

    /// Check every structural invariant. Cheap enough for tests and
    /// debug assertions, not meant for hot paths.
    pub fn is_consistent(&self) -> bool {
        if self.blocks.is_empty() {
            return false;
        }
        let mut seen = HashSet::with_capacity(self.blocks.len());
        let mut t = 0.0;
        for (i, block) in self.blocks.iter().enumerate() {
            if block.order != i || !seen.insert(&block.id) {
                return false;
            }
            if block.timing.start != t || block.timing.end != t + block.duration {
                return false;
            }
            t = block.timing.end;
        }
        true
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// Index of `id`, or `BlockNotFound`.
    pub(crate) fn require(&self, id: &BlockId) -> Result<usize> {
        self.index_of(id).ok_or_else(|| EditError::BlockNotFound(id.clone()))
    }

    /// Mint an id not present in the store.
    pub(crate) fn fresh_id(&self) -> BlockId {
        loop {
            let id = BlockId::generate();
            if self.index_of(&id).is_none() {
                return id;
            }
        }
    }

    /// Re-estimate a block after its content changed.
    pub(crate) fn reestimate(&mut self, index: usize) {
        let estimator = self.estimator;
        let block = &mut self.blocks[index];
        block.duration = estimator.estimate(&block.content);
        block.duration_source = DurationSource::Estimated;
    }

    /// Re-derive `order` and `timing` for the whole sequence and bump the
    /// version. Final step of every mutation.
    pub(crate) fn commit(&mut self) {
        let mut t = 0.0;
        for (i, block) in self.blocks.iter_mut().enumerate() {
            block.order = i;
            let end = t + block.duration;
            block.timing = Timing::new(t, end);
            t = end;
        }
        self.version += 1;
        debug_assert!(self.is_consistent(), "store invariants broken after commit");
    }

    // =========================================================================
    // Content Mutation
    // =========================================================================

    /// Replace a block's content. Ordering is untouched.
    pub fn update_content(&mut self, id: &BlockId, content: impl Into<String>) -> Result<()> {
        let index = self.require(id)?;
        self.blocks[index].content = content.into();
        self.reestimate(index);
        self.commit();
        tracing::debug!(block = %id, "updated content");
        Ok(())
    }

    /// Insert text at a char offset within a block.
    pub fn insert_text(&mut self, id: &BlockId, offset: usize, text: &str) -> Result<()> {
        let index = self.require(id)?;
        let block = &mut self.blocks[index];
        let at = byte_offset(&block.content, offset).ok_or(EditError::OffsetOutOfRange {
            offset,
            len: block.char_len(),
        })?;
        block.content.insert_str(at, text);
        self.reestimate(index);
        self.commit();
        Ok(())
    }

    /// Record a duration measured by the synthesis pipeline.
    ///
    /// Holds until the block's content changes, which reverts it to an
    /// estimate.
    pub fn set_measured_duration(&mut self, id: &BlockId, seconds: f64) -> Result<()> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(EditError::InvalidDuration(seconds));
        }
        let index = self.require(id)?;
        let block = &mut self.blocks[index];
        block.duration = seconds;
        block.duration_source = DurationSource::Measured;
        self.commit();
        tracing::debug!(block = %id, seconds, "recorded measured duration");
        Ok(())
    }

    /// Set a named effect.
    pub fn set_effect(&mut self, id: &BlockId, name: impl Into<String>, value: EffectValue) -> Result<()> {
        let index = self.require(id)?;
        self.blocks[index].effects.insert(name.into(), value);
        self.commit();
        Ok(())
    }

    /// Remove a named effect, returning its previous value.
    pub fn clear_effect(&mut self, id: &BlockId, name: &str) -> Result<Option<EffectValue>> {
        let index = self.require(id)?;
        let previous = self.blocks[index].effects.remove(name);
        if previous.is_some() {
            self.commit();
        }
        Ok(previous)
    }

    // =========================================================================
    // Structural Mutation
    // =========================================================================

    /// Insert a new block after `after` (`None` = at the front).
    pub fn insert_block(
        &mut self,
        after: Option<&BlockId>,
        kind: BlockKind,
        content: impl Into<String>,
    ) -> Result<BlockId> {
        let index = match after {
            Some(after_id) => self.require(after_id)? + 1,
            None => 0,
        };
        let id = self.fresh_id();
        self.blocks.insert(index, Block::new(id.clone(), kind, content));
        self.reestimate(index);
        self.commit();
        tracing::debug!(block = %id, index, %kind, "inserted block");
        Ok(id)
    }

    /// Remove a block. Returns the index it occupied.
    ///
    /// The only remaining block can't be deleted.
    pub fn delete_block(&mut self, id: &BlockId) -> Result<usize> {
        let index = self.require(id)?;
        if self.blocks.len() == 1 {
            return Err(EditError::SoleBlock(id.clone()));
        }
        self.blocks.remove(index);
        self.commit();
        tracing::debug!(block = %id, index, "deleted block");
        Ok(index)
    }
}

/// Byte offset of the `offset`-th char of `s`; `offset == char count` maps
/// to `s.len()`. `None` when past the end.
pub(crate) fn byte_offset(s: &str, offset: usize) -> Option<usize> {
    match s.char_indices().nth(offset) {
        Some((at, _)) => Some(at),
        None if s.chars().count() == offset => Some(s.len()),
        None => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
