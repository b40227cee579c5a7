//! Chip aggregation for the betting board.
//!
//! Placements sharing a bet shape and an identical target set (order-independent) are
//! folded into one display chip with their amounts summed. Aggregation is pure and
//! cheap: callers re-run it on every placement-list change and reset to an empty list
//! when the round changes.

use std::collections::HashMap;

use roundtable_types::{BetShape, RoundRecord, Stake};
use serde::Serialize;

/// Canonical grouping key: shape plus sorted, de-duplicated targets.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChipKey {
    pub shape: BetShape,
    pub targets: Vec<u64>,
}

/// Default shape-key function.
pub fn canonical_key(shape: BetShape, targets: &[u64]) -> ChipKey {
    let mut targets = targets.to_vec();
    targets.sort_unstable();
    targets.dedup();
    ChipKey { shape, targets }
}

/// Display aggregation of one or more placements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Chip {
    pub shape: BetShape,
    /// Market item ids, sorted.
    pub targets: Vec<u64>,
    /// Board positions for `targets`; ids without a known position are skipped.
    pub positions: Vec<u32>,
    pub amount: u64,
    /// Number of placements folded into this chip.
    pub placements: usize,
}

/// Group placements into chips.
///
/// `key_fn` normalizes a placement into its grouping key and `position_of` maps a market
/// id back to its board position. Chips are returned in order of first appearance.
pub fn aggregate<'a, S, K, P>(
    placements: impl IntoIterator<Item = &'a S>,
    key_fn: K,
    position_of: P,
) -> Vec<Chip>
where
    S: Stake + 'a,
    K: Fn(&S) -> ChipKey,
    P: Fn(u64) -> Option<u32>,
{
    let mut index: HashMap<ChipKey, usize> = HashMap::new();
    let mut chips: Vec<Chip> = Vec::new();
    for placement in placements {
        let key = key_fn(placement);
        let existing = index.get(&key).copied();
        match existing {
            Some(slot) => {
                let chip = &mut chips[slot];
                chip.amount = chip.amount.saturating_add(placement.amount());
                chip.placements += 1;
            }
            None => {
                let positions = key.targets.iter().filter_map(|id| position_of(*id)).collect();
                index.insert(key.clone(), chips.len());
                chips.push(Chip {
                    shape: key.shape,
                    targets: key.targets,
                    positions,
                    amount: placement.amount(),
                    placements: 1,
                });
            }
        }
    }
    chips
}

/// Aggregate with the default key and the round's own board positions.
///
/// Placements belonging to another round are ignored.
pub fn aggregate_round<'a, S>(
    round: &RoundRecord,
    placements: impl IntoIterator<Item = &'a S>,
) -> Vec<Chip>
where
    S: Stake + 'a,
{
    aggregate(
        placements.into_iter().filter(|p| p.round_id() == round.id),
        |p: &S| canonical_key(p.shape(), p.targets()),
        |id| round.position_of(id),
    )
}
