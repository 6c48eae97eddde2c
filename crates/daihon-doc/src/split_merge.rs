//! Cursor-aware split and merge.
//!
//! Offsets are char offsets into a block's content. A split keeps the
//! parent's id for the leading half and mints a fresh id for the trailing
//! half; a merge destroys the absorbed block and keeps the predecessor's id
//! and kind. Together they satisfy the round-trip law
//! `merge_left(split_at(b, k)) == b` on content.

use daihon_types::Block;

use crate::store::{byte_offset, BlockStore};
use crate::{BlockId, EditError, Result};

impl BlockStore {
    /// Split `id` at char `offset`, returning the new trailing block's id.
    ///
    /// The trailing block inherits the parent's kind and a copy of its
    /// effects. Both halves are re-estimated.
    pub fn split_at(&mut self, id: &BlockId, offset: usize) -> Result<BlockId> {
        let index = self.require(id)?;
        let parent = &self.blocks[index];
        let at = byte_offset(&parent.content, offset).ok_or(EditError::OffsetOutOfRange {
            offset,
            len: parent.char_len(),
        })?;

        let child_id = self.fresh_id();
        let parent = &mut self.blocks[index];
        let tail = parent.content.split_off(at);
        let mut child = Block::new(child_id.clone(), parent.kind, tail);
        child.effects = parent.effects.clone();

        self.blocks.insert(index + 1, child);
        self.reestimate(index);
        self.reestimate(index + 1);
        self.commit();

        tracing::debug!(block = %id, child = %child_id, offset, "split block");
        Ok(child_id)
    }

    /// Merge `id` into its predecessor.
    ///
    /// Returns the merge boundary: the predecessor's char length before the
    /// merge, where the cursor belongs afterwards.
    pub fn merge_left(&mut self, id: &BlockId) -> Result<usize> {
        let index = self.require(id)?;
        if index == 0 {
            return Err(EditError::NoPredecessor(id.clone()));
        }

        let absorbed = self.blocks.remove(index);
        let predecessor = &mut self.blocks[index - 1];
        let boundary = predecessor.char_len();
        predecessor.content.push_str(&absorbed.content);
        let into = predecessor.id.clone();

        self.reestimate(index - 1);
        self.commit();

        tracing::debug!(block = %id, into = %into, boundary, "merged block left");
        Ok(boundary)
    }
}
