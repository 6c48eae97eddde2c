//! Typed block identifiers.
//!
//! `BlockId` is opaque text: ids arrive from persisted documents in
//! whatever form the backend minted them, and freshly split blocks get a
//! UUIDv7 rendered as text. The `short()` form is for human-facing output
//! only, never lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, stable block identifier.
///
/// Assigned once when the block is loaded or created by a split and never
/// mutated afterwards. Equality is plain string equality; the store is
/// responsible for rejecting duplicates.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Mint a fresh identifier (UUIDv7 text).
    ///
    /// Time-ordered UUIDs never collide with one another; collisions with
    /// backend-minted ids are caught by the store's duplicate check.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Wrap an existing identifier. Returns `None` for empty or
    /// whitespace-only input, which the load path treats as missing.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// The raw identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Up to 8 leading characters, for logs and tables.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.short())
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
