//! Index-pair reordering.
//!
//! Drag-and-drop libraries report a drop as a source index and an optional
//! destination index (absent when the item is dropped outside the list).
//! [`DragEnd`] captures exactly that, independent of any gesture library.
//! Identity is carried by [`BlockId`](crate::BlockId), so a consumer that
//! tracks its selection by id keeps highlighting the moved block.

use crate::store::BlockStore;
use crate::{BlockId, EditError, Result};

/// End of a drag gesture over the block list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DragEnd {
    pub source: usize,
    /// `None` when the drop landed outside the list.
    pub destination: Option<usize>,
}

impl BlockStore {
    /// Move the block at `source` so it ends up at `destination`, shifting
    /// the blocks in between by one.
    ///
    /// Returns `Ok(false)` when the indices are equal (nothing to do).
    /// `order` is reassigned for the whole sequence in one commit.
    pub fn reorder(&mut self, source: usize, destination: usize) -> Result<bool> {
        let len = self.blocks.len();
        for index in [source, destination] {
            if index >= len {
                return Err(EditError::IndexOutOfRange { index, len });
            }
        }
        if source == destination {
            return Ok(false);
        }

        let block = self.blocks.remove(source);
        tracing::debug!(block = %block.id, source, destination, "reordered block");
        self.blocks.insert(destination, block);
        self.commit();
        Ok(true)
    }

    /// Move a block, addressed by id, to `destination`.
    pub fn move_block(&mut self, id: &BlockId, destination: usize) -> Result<bool> {
        let source = self.require(id)?;
        self.reorder(source, destination)
    }

    /// Apply a finished drag gesture.
    pub fn apply_drag(&mut self, drag: DragEnd) -> Result<bool> {
        match drag.destination {
            Some(destination) => self.reorder(drag.source, destination),
            None => Ok(false),
        }
    }
}
