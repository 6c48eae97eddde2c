//! Keyboard-intent navigation.
//!
//! Maps `(focus, intent)` to a store operation and a new focus, independent
//! of how the intent was produced (key event, IME, command palette):
//!
//! | Intent         | Precondition              | Operation         | New focus                      |
//! |----------------|---------------------------|-------------------|--------------------------------|
//! | `Split`        | -                         | `split_at(B, k)`  | trailing half, offset 0        |
//! | `LiteralBreak` | -                         | insert `\n` at k  | same block, k + 1              |
//! | `Merge`        | k == 0, B not first       | `merge_left(B)`   | predecessor, merge boundary    |
//! | `DeleteBlock`  | more than one block       | `delete_block(B)` | block now at B's index, else previous |
//! | `MoveUp`       | k == 0, B not first       | -                 | end of previous block          |
//! | `MoveDown`     | k == len, B not last      | -                 | start of next block            |
//!
//! No intent ever changes a block's kind.

use crate::store::BlockStore;
use crate::{BlockId, EditError, Result};

/// Current edit position: a block and a char offset into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Focus {
    pub block_id: BlockId,
    pub offset: usize,
}

impl Focus {
    pub fn new(block_id: BlockId, offset: usize) -> Self {
        Self { block_id, offset }
    }
}

/// Device-independent editing intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Split the focused block at the cursor (Enter).
    Split,
    /// Insert a line break without splitting (Shift+Enter).
    LiteralBreak,
    /// Merge the focused block into its predecessor (Backspace at start).
    Merge,
    /// Remove the focused block.
    DeleteBlock,
    /// Jump to the end of the previous block (Up at start).
    MoveUp,
    /// Jump to the start of the next block (Down at end).
    MoveDown,
}

/// What an intent did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The document changed (and focus moved with it).
    Edited,
    /// Only the focus moved.
    Moved,
    /// Precondition not met; nothing happened.
    Unchanged,
}

/// Focus state machine driving the store.
#[derive(Clone, Debug, Default)]
pub struct NavigationController {
    focus: Option<Focus>,
}

impl NavigationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> Option<&Focus> {
        self.focus.as_ref()
    }

    /// Focus `id`, clamping `offset` to the block's length.
    pub fn set_focus(&mut self, store: &BlockStore, id: &BlockId, offset: usize) -> Result<()> {
        let index = store.require(id)?;
        let len = store.blocks()[index].char_len();
        self.focus = Some(Focus::new(id.clone(), offset.min(len)));
        Ok(())
    }

    pub fn clear_focus(&mut self) {
        self.focus = None;
    }

    /// Re-check focus after a mutation that didn't go through [`apply`].
    ///
    /// A focus on a vanished block is dropped; an offset past the end of a
    /// shortened block is clamped.
    ///
    /// [`apply`]: NavigationController::apply
    pub fn revalidate(&mut self, store: &BlockStore) {
        let Some(focus) = self.focus.as_mut() else {
            return;
        };
        match store.get(&focus.block_id) {
            Some(block) => focus.offset = focus.offset.min(block.char_len()),
            None => self.focus = None,
        }
    }

    /// Apply an intent at the current focus.
    ///
    /// Errors are rejections (no focus, stale focus, deleting the sole
    /// block); the store is unchanged when one is returned.
    pub fn apply(&mut self, store: &mut BlockStore, intent: Intent) -> Result<Transition> {
        let focus = self.focus.clone().ok_or(EditError::NoFocus)?;
        let index = store.require(&focus.block_id)?;
        let len = store.blocks()[index].char_len();
        let offset = focus.offset.min(len);
        let id = focus.block_id;

        let transition = match intent {
            Intent::Split => {
                let tail = store.split_at(&id, offset)?;
                self.focus = Some(Focus::new(tail, 0));
                Transition::Edited
            }
            Intent::LiteralBreak => {
                store.insert_text(&id, offset, "\n")?;
                self.focus = Some(Focus::new(id, offset + 1));
                Transition::Edited
            }
            Intent::Merge => {
                if offset != 0 || index == 0 {
                    return Ok(Transition::Unchanged);
                }
                let predecessor = store.blocks()[index - 1].id.clone();
                let boundary = store.merge_left(&id)?;
                self.focus = Some(Focus::new(predecessor, boundary));
                Transition::Edited
            }
            Intent::DeleteBlock => {
                let former = store.delete_block(&id)?;
                let landing = store
                    .blocks()
                    .get(former)
                    .or_else(|| store.blocks().get(former.saturating_sub(1)))
                    .map(|b| b.id.clone());
                self.focus = landing.map(|id| Focus::new(id, 0));
                Transition::Edited
            }
            Intent::MoveUp => {
                if offset != 0 || index == 0 {
                    return Ok(Transition::Unchanged);
                }
                let prev = &store.blocks()[index - 1];
                self.focus = Some(Focus::new(prev.id.clone(), prev.char_len()));
                Transition::Moved
            }
            Intent::MoveDown => {
                if offset != len || index + 1 >= store.len() {
                    return Ok(Transition::Unchanged);
                }
                let next = &store.blocks()[index + 1];
                self.focus = Some(Focus::new(next.id.clone(), 0));
                Transition::Moved
            }
        };

        tracing::trace!(?intent, ?transition, focus = ?self.focus, "applied intent");
        Ok(transition)
    }
}
