//! Initial document load.
//!
//! A payload is an ordered array of `{id, type, content, order}` records.
//! Entries that cannot become a block are skipped and reported; no
//! partially-constructed block is ever admitted. Derived fields in the
//! payload are ignored.

use std::collections::HashSet;

use daihon_types::{Block, BlockId, BlockKind, BlockRecord};

use crate::error::ValidationError;

/// Outcome of a load: how many blocks came in and what was skipped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    /// Blocks admitted from the payload.
    pub loaded: usize,
    /// One entry per skipped payload item.
    pub skipped: Vec<ValidationError>,
    /// True when nothing valid remained and an empty block was seeded.
    pub seeded: bool,
}

impl LoadReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Parse a JSON array into per-entry records.
///
/// Only a payload that is not an array at all fails as a whole; a single
/// entry of the wrong shape becomes [`ValidationError::Malformed`].
pub fn parse_records(
    text: &str,
) -> serde_json::Result<Vec<Result<BlockRecord, ValidationError>>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(text)?;
    Ok(values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value::<BlockRecord>(value).map_err(|e| ValidationError::Malformed {
                index,
                reason: e.to_string(),
            })
        })
        .collect())
}

/// Turn payload entries into blocks in document order.
///
/// Blocks come back sorted by their `order` field (stable; an entry without
/// one is keyed by its array position). Derived fields are left zeroed for
/// the store to fill in.
pub(crate) fn admit(entries: Vec<Result<BlockRecord, ValidationError>>) -> (Vec<Block>, LoadReport) {
    let mut report = LoadReport::default();
    let mut seen = HashSet::new();
    let mut admitted: Vec<(i64, Block)> = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let admitted_block = entry.and_then(|record| admit_one(index, record, &mut seen));
        match admitted_block {
            Ok(pair) => admitted.push(pair),
            Err(e) => {
                tracing::warn!("skipping load entry: {e}");
                report.skipped.push(e);
            }
        }
    }

    admitted.sort_by_key(|(key, _)| *key);
    report.loaded = admitted.len();
    (admitted.into_iter().map(|(_, block)| block).collect(), report)
}

fn admit_one(
    index: usize,
    record: BlockRecord,
    seen: &mut HashSet<BlockId>,
) -> Result<(i64, Block), ValidationError> {
    let id = record
        .id
        .and_then(|raw| BlockId::parse(raw))
        .ok_or(ValidationError::MissingId { index })?;

    let kind_str = record.kind.ok_or(ValidationError::MissingType { index })?;
    let kind = BlockKind::from_str(kind_str.trim()).ok_or_else(|| ValidationError::UnknownType {
        index,
        value: kind_str.clone(),
    })?;

    if !seen.insert(id.clone()) {
        return Err(ValidationError::DuplicateId {
            index,
            id: id.as_str().to_string(),
        });
    }

    let key = record.order.unwrap_or(index as i64);
    let mut block = Block::new(id, kind, record.content.unwrap_or_default());
    block.effects = record.effects;
    Ok((key, block))
}
