//! Block types for the script document.
//!
//! A script is an ordered sequence of [`Block`]s. Each block carries one
//! semantic role ([`BlockKind`]), its narration text, and two derived fields
//! the document core keeps current: `duration` and `timing`.
//!
//! ## Design: stored vs. derived
//!
//! Only `id`, `kind`, `content`, `order` and `effects` travel on the wire
//! ([`BlockRecord`]). `duration` and `timing` are always recomputed locally;
//! a persisted payload may carry them, but they are never trusted.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::ids::BlockId;

/// Semantic role of a block (closed set).
///
/// Immutable for the block's lifetime: a split child inherits its parent's
/// kind, and a merge keeps the absorbing block's kind.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum BlockKind {
    /// Opening line that grabs attention.
    Hook,
    /// Main narration.
    #[default]
    Body,
    /// Call to action at the end.
    #[strum(serialize = "cta", serialize = "call_to_action")]
    Cta,
}

impl BlockKind {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Hook => "hook",
            BlockKind::Body => "body",
            BlockKind::Cta => "cta",
        }
    }

    /// All kinds, in the order a script usually uses them.
    pub fn all() -> [BlockKind; 3] {
        [BlockKind::Hook, BlockKind::Body, BlockKind::Cta]
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a block's `duration` came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DurationSource {
    /// Heuristic estimate from the text.
    #[default]
    Estimated,
    /// Measured by the synthesis pipeline for the current content.
    Measured,
}

/// Position of a block on the timeline, in seconds.
///
/// Half-open: a block covers `[start, end)`. Consecutive blocks share a
/// boundary, so `next.start == prev.end` exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub start: f64,
    pub end: f64,
}

impl Timing {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length of the span.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `t` falls inside `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

/// Value of a named effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectValue {
    Toggle(bool),
    Number(f64),
    Text(String),
}

/// Named optional toggles/parameters on a block (e.g. `"zoom_in": true`).
///
/// Not structurally load-bearing: effects never influence order or timing.
pub type Effects = BTreeMap<String, EffectValue>;

/// One block of the script, including derived fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Stable identity.
    pub id: BlockId,
    /// Semantic role.
    #[serde(rename = "type")]
    pub kind: BlockKind,
    /// Narration text.
    pub content: String,
    /// Index in the authoritative sequence.
    pub order: usize,
    /// Derived seconds.
    pub duration: f64,
    /// Whether `duration` is an estimate or a measurement.
    #[serde(default)]
    pub duration_source: DurationSource,
    /// Derived `[start, end)` on the timeline.
    pub timing: Timing,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub effects: Effects,
}

impl Block {
    /// Create a block with zeroed derived fields.
    ///
    /// The store fills in `order`, `duration` and `timing` when the block is
    /// admitted, so callers never compute them by hand.
    pub fn new(id: BlockId, kind: BlockKind, content: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            content: content.into(),
            order: 0,
            duration: 0.0,
            duration_source: DurationSource::Estimated,
            timing: Timing::default(),
            effects: Effects::new(),
        }
    }

    /// Content length in chars, the unit cursor offsets are measured in.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Whether the duration was measured rather than estimated.
    pub fn is_measured(&self) -> bool {
        self.duration_source == DurationSource::Measured
    }

    /// Project to the wire shape (drops derived fields).
    pub fn to_record(&self) -> BlockRecord {
        BlockRecord {
            id: Some(self.id.as_str().to_string()),
            kind: Some(self.kind.as_str().to_string()),
            content: Some(self.content.clone()),
            order: Some(self.order as i64),
            effects: self.effects.clone(),
        }
    }
}

/// Loose wire shape of a block, as loaded from or persisted to a backend.
///
/// Every field is optional so that a malformed entry can be deserialized and
/// then rejected with a precise reason instead of failing the whole array.
/// Unknown fields (e.g. a stale `duration`) are ignored. An integer `id` is
/// accepted and kept in its decimal form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    #[serde(
        default,
        deserialize_with = "id_from_string_or_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub effects: Effects,
}

impl BlockRecord {
    /// Convenience constructor for a well-formed record.
    pub fn new(id: &str, kind: BlockKind, content: &str, order: i64) -> Self {
        Self {
            id: Some(id.to_string()),
            kind: Some(kind.as_str().to_string()),
            content: Some(content.to_string()),
            order: Some(order),
            effects: Effects::new(),
        }
    }
}

fn id_from_string_or_integer<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(text) => text,
        RawId::Signed(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    }))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ── BlockKind ───────────────────────────────────────────────────────

    #[test]
    fn test_block_kind_parsing() {
        assert_eq!(BlockKind::from_str("hook"), Some(BlockKind::Hook));
        assert_eq!(BlockKind::from_str("BODY"), Some(BlockKind::Body));
        assert_eq!(BlockKind::from_str("Cta"), Some(BlockKind::Cta));
        assert_eq!(BlockKind::from_str("call_to_action"), Some(BlockKind::Cta));
        assert_eq!(BlockKind::from_str("outro"), None);
    }

    #[test]
    fn test_block_kind_as_str_roundtrip() {
        for kind in BlockKind::all() {
            assert_eq!(BlockKind::from_str(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_block_kind_serde_lowercase() {
        assert_eq!(serde_json::to_string(&BlockKind::Cta).unwrap(), "\"cta\"");
        let kind: BlockKind = serde_json::from_str("\"hook\"").unwrap();
        assert_eq!(kind, BlockKind::Hook);
    }

    // ── Timing ──────────────────────────────────────────────────────────

    #[test]
    fn test_timing_is_half_open() {
        let t = Timing::new(1.0, 2.5);
        assert!(t.contains(1.0));
        assert!(t.contains(2.4));
        assert!(!t.contains(2.5));
        assert!(!t.contains(0.99));
        assert!((t.duration() - 1.5).abs() < 1e-9);
    }

    // ── Block ───────────────────────────────────────────────────────────

    #[test]
    fn test_block_serializes_kind_as_type() {
        let block = Block::new(BlockId::from("a"), BlockKind::Hook, "Hello");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "hook");
        assert_eq!(json["content"], "Hello");
        assert!(json.get("effects").is_none());
    }

    #[test]
    fn test_char_len_counts_glyphs_not_bytes() {
        let block = Block::new(BlockId::from("a"), BlockKind::Body, "가나다");
        assert_eq!(block.char_len(), 3);
        assert_eq!(block.content.len(), 9);
    }

    #[test]
    fn test_to_record_drops_derived_fields() {
        let mut block = Block::new(BlockId::from("a"), BlockKind::Cta, "Subscribe");
        block.order = 4;
        block.duration = 0.5;
        block
            .effects
            .insert("shake".to_string(), EffectValue::Toggle(true));

        let record = block.to_record();
        assert_eq!(record.id.as_deref(), Some("a"));
        assert_eq!(record.kind.as_deref(), Some("cta"));
        assert_eq!(record.order, Some(4));
        assert_eq!(record.effects.get("shake"), Some(&EffectValue::Toggle(true)));

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("duration").is_none());
        assert!(json.get("timing").is_none());
    }

    // ── BlockRecord ─────────────────────────────────────────────────────

    #[test]
    fn test_record_tolerates_missing_and_unknown_fields() {
        let record: BlockRecord =
            serde_json::from_str(r#"{"content": "hi", "duration": 99.0}"#).unwrap();
        assert!(record.id.is_none());
        assert!(record.kind.is_none());
        assert_eq!(record.content.as_deref(), Some("hi"));
    }

    #[test]
    fn test_effect_values_untagged() {
        let record: BlockRecord = serde_json::from_str(
            r#"{"id": "x", "type": "body", "effects": {"blur": true, "speed": 1.5, "font": "serif"}}"#,
        )
        .unwrap();
        assert_eq!(record.effects.get("blur"), Some(&EffectValue::Toggle(true)));
        assert_eq!(record.effects.get("speed"), Some(&EffectValue::Number(1.5)));
        assert_eq!(
            record.effects.get("font"),
            Some(&EffectValue::Text("serif".to_string()))
        );
    }

    #[test]
    fn test_record_accepts_integer_id() {
        let record: BlockRecord = serde_json::from_str(r#"{"id": 5, "type": "body"}"#).unwrap();
        assert_eq!(record.id.as_deref(), Some("5"));

        let record: BlockRecord =
            serde_json::from_str(r#"{"id": 18446744073709551615, "type": "body"}"#).unwrap();
        assert_eq!(record.id.as_deref(), Some("18446744073709551615"));

        let record: BlockRecord = serde_json::from_str(r#"{"id": null, "type": "body"}"#).unwrap();
        assert!(record.id.is_none());

        assert!(serde_json::from_str::<BlockRecord>(r#"{"id": true}"#).is_err());
    }
}
