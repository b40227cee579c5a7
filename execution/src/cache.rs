//! Round-scoped query cache and stale-response guard.
//!
//! Responses from the backend can arrive after the round they were requested for has
//! been replaced. [`RoundGuard`] drops them. [`QueryCache`] keeps the last value fetched
//! per entity and forgets everything tied to a round once that round is invalidated;
//! wallet entries are not tied to a round and survive.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

/// Tracks the active round id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoundGuard {
    current: Option<u64>,
}

impl RoundGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<u64> {
        self.current
    }

    /// Whether a response for `round_id` still belongs to the active round.
    pub fn admit(&self, round_id: u64) -> bool {
        match self.current {
            Some(current) if current == round_id => true,
            Some(current) => {
                debug!(current, round_id, "dropping stale response");
                false
            }
            None => {
                debug!(round_id, "dropping response before any round is active");
                false
            }
        }
    }

    /// Move to `round_id`. Returns true when a new round replaced the old one.
    ///
    /// Round ids never move backwards; an older id is ignored.
    pub fn advance(&mut self, round_id: u64) -> bool {
        match self.current {
            Some(current) if round_id <= current => {
                if round_id < current {
                    debug!(current, round_id, "ignoring older round");
                }
                false
            }
            _ => {
                self.current = Some(round_id);
                true
            }
        }
    }
}

/// Kind of cached entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Round,
    Placements,
    Outcome,
    Wallet,
}

impl EntityKind {
    pub fn is_round_scoped(&self) -> bool {
        !matches!(self, EntityKind::Wallet)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey {
    pub kind: EntityKind,
    /// Round id for round-scoped kinds; always 0 for the wallet.
    pub id: u64,
}

impl CacheKey {
    pub fn round(round_id: u64) -> Self {
        Self {
            kind: EntityKind::Round,
            id: round_id,
        }
    }

    pub fn placements(round_id: u64) -> Self {
        Self {
            kind: EntityKind::Placements,
            id: round_id,
        }
    }

    pub fn outcome(round_id: u64) -> Self {
        Self {
            kind: EntityKind::Outcome,
            id: round_id,
        }
    }

    /// The signed-in user's wallet.
    pub fn wallet() -> Self {
        Self {
            kind: EntityKind::Wallet,
            id: 0,
        }
    }
}

#[derive(Clone, Debug)]
struct Entry<V> {
    value: V,
    stored_at_ms: u64,
}

/// Last fetched value per entity, with an optional time-to-live.
#[derive(Clone, Debug)]
pub struct QueryCache<V> {
    entries: HashMap<CacheKey, Entry<V>>,
    ttl_ms: Option<u64>,
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<V> QueryCache<V> {
    pub fn new(ttl_ms: Option<u64>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: CacheKey, value: V, now_ms: u64) -> Option<V> {
        self.entries
            .insert(
                key,
                Entry {
                    value,
                    stored_at_ms: now_ms,
                },
            )
            .map(|entry| entry.value)
    }

    /// Cached value for `key`, unless it has outlived the ttl.
    pub fn get(&self, key: &CacheKey, now_ms: u64) -> Option<&V> {
        let entry = self.entries.get(key)?;
        if let Some(ttl) = self.ttl_ms {
            if now_ms.saturating_sub(entry.stored_at_ms) > ttl {
                return None;
            }
        }
        Some(&entry.value)
    }

    pub fn remove(&mut self, key: &CacheKey) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Drop every round-scoped entry for `round_id`. Returns the number removed.
    pub fn invalidate_round(&mut self, round_id: u64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|key, _| !(key.kind.is_round_scoped() && key.id == round_id));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(round_id, removed, "invalidated cached round entries");
        }
        removed
    }
}
