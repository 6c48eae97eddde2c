//! Error types for document operations.

use thiserror::Error;

use crate::BlockId;

/// A rejected edit.
///
/// Every variant means "the requested edit had no effect": the store is
/// left exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    /// Block not found in the document.
    #[error("block not found: {0:?}")]
    BlockNotFound(BlockId),

    /// Attempted to delete the only remaining block.
    #[error("cannot delete {0:?}: a script keeps at least one block")]
    SoleBlock(BlockId),

    /// Cursor offset past the end of the block's content.
    #[error("offset {offset} out of range for block with length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },

    /// Sequence index out of range (reorder, insert).
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Merge-left on the first block.
    #[error("block {0:?} has no predecessor to merge into")]
    NoPredecessor(BlockId),

    /// A measured duration that is negative, NaN or infinite.
    #[error("invalid duration {0}")]
    InvalidDuration(f64),

    /// Intent dispatched with no focused block.
    #[error("no block has focus")]
    NoFocus,
}

/// Why a load entry was skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Entry is not a JSON object of the expected shape.
    #[error("entry {index}: malformed ({reason})")]
    Malformed { index: usize, reason: String },

    /// Entry lacks an `id`.
    #[error("entry {index}: missing id")]
    MissingId { index: usize },

    /// Entry lacks a `type`.
    #[error("entry {index}: missing type")]
    MissingType { index: usize },

    /// Entry's `type` is not one of the known block kinds.
    #[error("entry {index}: unknown type {value:?}")]
    UnknownType { index: usize, value: String },

    /// Entry repeats an id already admitted earlier in the payload.
    #[error("entry {index}: duplicate id {id:?}")]
    DuplicateId { index: usize, id: String },
}

impl ValidationError {
    /// Position of the offending entry in the payload.
    pub fn index(&self) -> usize {
        match self {
            ValidationError::Malformed { index, .. }
            | ValidationError::MissingId { index }
            | ValidationError::MissingType { index }
            | ValidationError::UnknownType { index, .. }
            | ValidationError::DuplicateId { index, .. } => *index,
        }
    }
}

/// Errors loading an [`EditorConfig`](crate::EditorConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}
