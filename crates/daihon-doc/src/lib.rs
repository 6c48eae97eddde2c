//! Block-structured script document model for Daihon.
//!
//! A script is an ordered sequence of typed blocks (hook, body, cta). The
//! [`BlockStore`] owns that sequence and is the only thing that mutates it;
//! everything else is either a transition over the store or a projection
//! of it.
//!
//! # Components
//!
//! - **Estimator**: content → seconds, from glyph and word counts
//! - **Store**: ordered blocks, contiguous `order`, gapless `timing`
//! - **Split / merge**: cursor-aware, identity-preserving
//! - **Reorder**: index-pair moves from drag gestures
//! - **Navigation**: `(focus, intent)` → operation + new focus
//! - **Timeline**: time-indexed projection with seek and zoom
//! - **Editor**: owns all of the above and publishes events
//!
//! # Invariants
//!
//! After every call that returns, the store satisfies:
//! - `order` is `0..n` in sequence position
//! - `timing[i].start == timing[i-1].end`, `timing[0].start == 0`
//! - `n >= 1`
//! - ids are unique and never reused for a different block
//!
//! A call that returns `Err` leaves the store as it found it.

pub mod config;
mod editor;
mod error;
pub mod estimate;
mod load;
mod nav;
mod reorder;
mod split_merge;
mod store;
mod timeline;

pub use config::{EditorConfig, EstimatorConfig, TimelineConfig};
pub use editor::{DurationSummary, EditorEvent, EventSink, ScriptEditor, SharedEditor};
pub use error::{ConfigError, EditError, ValidationError};
pub use estimate::DurationEstimator;
pub use load::{parse_records, LoadReport};
pub use nav::{Focus, Intent, NavigationController, Transition};
pub use reorder::DragEnd;
pub use store::BlockStore;
pub use timeline::{Span, Timeline, TimelineIndex};

pub use daihon_types::{
    Block, BlockId, BlockKind, BlockRecord, DurationSource, EffectValue, Effects, Timing,
};

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, EditError>;
