//! Shared identity and block types for Daihon.
//!
//! This crate is the foundation the document core builds on: typed IDs,
//! the [`Block`] value, its closed set of roles, derived timing, effect
//! toggles, and the [`BlockRecord`] shape used on the load/persist wire.
//! It has **no internal daihon dependencies**.
//!
//! # Entity Overview
//!
//! ```text
//! Script                     ← one narrated video script
//!     └── ordered Blocks (BlockId, stable for the block's lifetime)
//!             ├── kind      hook / body / cta (immutable)
//!             ├── content   text the narrator reads
//!             ├── order     == index in the sequence
//!             ├── duration  derived seconds (estimated or measured)
//!             └── timing    derived [start, end) prefix sum
//! ```
//!
//! # Key Types
//!
//! |------------------|-----------------------------------------------|
//! | Type             | Purpose                                       |
//! |------------------|-----------------------------------------------|
//! | [`BlockId`]      | Opaque, never-reused block identity           |
//! | [`BlockKind`]    | Semantic role of a block                      |
//! | [`Block`]        | Full block state, including derived fields    |
//! | [`Timing`]       | `[start, end)` seconds on the timeline        |
//! | [`Effects`]      | Named optional toggles/parameters             |
//! | [`BlockRecord`]  | Loose wire shape for load and persistence     |
//! |------------------|-----------------------------------------------|

pub mod block;
pub mod ids;

// Re-export primary types at crate root for convenience.
pub use block::{
    Block, BlockKind, BlockRecord, DurationSource, EffectValue, Effects, Timing,
};
pub use ids::BlockId;
