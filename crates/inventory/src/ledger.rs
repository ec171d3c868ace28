//! Rebuilding positions from the movement log.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::movement::{StockKey, StockMovement};
use crate::position::StockPosition;

/// Fold every movement of `key` (in log order) into a fresh position.
///
/// Movements for other keys are skipped, so the whole tenant log can be passed.
pub fn reconstruct<'a, I>(key: StockKey, movements: I) -> StockPosition
where
    I: IntoIterator<Item = &'a StockMovement>,
{
    let mut position = StockPosition::empty(key);
    for movement in movements.into_iter().filter(|m| m.key() == key) {
        position.apply(movement);
    }
    position
}

/// Fold a log into one position per key it touches.
pub fn fold_all<'a, I>(movements: I) -> BTreeMap<StockKey, StockPosition>
where
    I: IntoIterator<Item = &'a StockMovement>,
{
    let mut positions: BTreeMap<StockKey, StockPosition> = BTreeMap::new();
    for movement in movements {
        positions
            .entry(movement.key())
            .or_insert_with(|| StockPosition::empty(movement.key()))
            .apply(movement);
    }
    positions
}

/// A key whose materialised position disagrees with its movement log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionMismatch {
    pub key: StockKey,
    /// `None` when the log has movements for a key with no materialised row.
    pub materialised: Option<StockPosition>,
    /// `None` when a materialised row has no movements behind it.
    pub reconstructed: Option<StockPosition>,
}

/// Compare materialised positions with the fold of `movements`.
///
/// Empty result means every position equals its log.
pub fn verify<'a, P, I>(materialised: P, movements: I) -> Vec<PositionMismatch>
where
    P: IntoIterator<Item = &'a StockPosition>,
    I: IntoIterator<Item = &'a StockMovement>,
{
    let mut rebuilt = fold_all(movements);
    let mut mismatches = Vec::new();

    for position in materialised {
        match rebuilt.remove(&position.key()) {
            Some(expected) if expected == *position => {}
            Some(expected) => mismatches.push(PositionMismatch {
                key: position.key(),
                materialised: Some(position.clone()),
                reconstructed: Some(expected),
            }),
            None if *position == StockPosition::empty(position.key()) => {}
            None => mismatches.push(PositionMismatch {
                key: position.key(),
                materialised: Some(position.clone()),
                reconstructed: None,
            }),
        }
    }

    mismatches.extend(rebuilt.into_values().map(|expected| PositionMismatch {
        key: expected.key(),
        materialised: None,
        reconstructed: Some(expected),
    }));
    mismatches.sort_by_key(|m| m.key);
    mismatches
}
