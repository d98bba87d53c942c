//! Header normalization and duplicate-column resolution.
//!
//! Headers are trimmed, lowercased and have each whitespace character replaced
//! with `_`. Columns whose headers collapse to the same name are treated as
//! redundant captures of one field: the instance with the most non-missing
//! cells survives, the first occurrence winning ties.

use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::{data::Value, frame::Table};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateResolution {
    pub name: String,
    /// Physical index (before removal) of the surviving column.
    pub kept_index: usize,
    /// Non-missing counts of every candidate, in header order.
    pub non_missing: Vec<usize>,
}

pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Returns the position of the candidate with the most non-missing cells.
/// Ties resolve to the earliest candidate; an empty slice yields 0.
pub fn pick_survivor(candidates: &[&[Value]]) -> usize {
    let mut best = 0;
    let mut best_count = None;
    for (pos, cells) in candidates.iter().enumerate() {
        let count = cells.iter().filter(|v| !v.is_missing()).count();
        if best_count.is_none_or(|current| count > current) {
            best = pos;
            best_count = Some(count);
        }
    }
    best
}

/// Normalizes every header in place and drops redundant duplicate columns.
pub fn normalize_columns(table: &mut Table) -> Vec<DuplicateResolution> {
    for (idx, header) in table.headers_mut().iter_mut().enumerate() {
        let normalized = normalize_header(header);
        *header = if normalized.is_empty() {
            format!("unnamed_{idx}")
        } else {
            normalized
        };
    }

    let groups = table
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), idx))
        .into_group_map();

    let mut keep = vec![true; table.width()];
    let mut resolutions = Vec::new();
    for (name, positions) in groups
        .into_iter()
        .filter(|(_, positions)| positions.len() > 1)
        .sorted_by_key(|(_, positions)| positions[0])
    {
        let candidates = positions
            .iter()
            .map(|&idx| table.column_at(idx))
            .collect::<Vec<_>>();
        let survivor = positions[pick_survivor(&candidates)];
        let non_missing = positions
            .iter()
            .map(|&idx| table.non_missing_count(idx))
            .collect::<Vec<_>>();
        for &idx in &positions {
            keep[idx] = idx == survivor;
        }
        info!(
            "Resolving duplicate '{name}': keeping index {survivor} with {} non-missing value(s) out of {:?}",
            table.non_missing_count(survivor),
            non_missing
        );
        resolutions.push(DuplicateResolution {
            name,
            kept_index: survivor,
            non_missing,
        });
    }

    table.retain_columns(&keep);
    resolutions
}
