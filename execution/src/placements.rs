//! Optimistic placement book for the active round.
//!
//! A submitted bet is shown immediately as [`Placement::Pending`] under a client-generated
//! [`TempId`]. When the backend acknowledges it, the pending entry is swapped for the
//! server's [`PlacementRecord`]; a rejection removes it. Refetching the server list
//! replaces every confirmed entry and keeps the still-pending ones.

use roundtable_types::{
    BetShape, LocalPlacement, Placement, PlacementRecord, RoundRecord, Stake, TempId,
    WalletSnapshot,
};
use thiserror::Error;
use tracing::debug;

use crate::bet_validation::{validate_stake, validate_targets, BetError};
use crate::round_clock::RoundClock;
use crate::rules::GameRules;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlacementError {
    #[error(transparent)]
    Bet(#[from] BetError),
    #[error("no pending placement {0}")]
    UnknownTempId(TempId),
    #[error("placement belongs to round {got}, book tracks round {expected}")]
    WrongRound { expected: u64, got: u64 },
}

/// Placements of the current user for one round.
#[derive(Clone, Debug, Default)]
pub struct PlacementBook {
    round_id: u64,
    next_temp_id: u64,
    entries: Vec<Placement>,
}

impl PlacementBook {
    pub fn new(round_id: u64) -> Self {
        Self {
            round_id,
            next_temp_id: 1,
            entries: Vec::new(),
        }
    }

    pub fn round_id(&self) -> u64 {
        self.round_id
    }

    pub fn entries(&self) -> &[Placement] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placement> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|p| p.is_pending()).count()
    }

    /// Confirmed records, for outcome resolution.
    pub fn own_placements(&self) -> Vec<PlacementRecord> {
        self.entries
            .iter()
            .filter_map(|p| p.record().cloned())
            .collect()
    }

    fn pending_stake(&self) -> u64 {
        self.entries
            .iter()
            .filter(|p| p.is_pending())
            .fold(0u64, |acc, p| acc.saturating_add(p.amount()))
    }

    /// Validate and record a new bet.
    ///
    /// Stakes still awaiting confirmation count against the wallet, since the wallet
    /// snapshot only reflects acknowledged bets.
    #[allow(clippy::too_many_arguments)]
    pub fn submit(
        &mut self,
        round: &RoundRecord,
        rules: &GameRules,
        wallet: Option<&WalletSnapshot>,
        shape: BetShape,
        targets: Vec<u64>,
        amount: u64,
        now_ms: u64,
    ) -> Result<TempId, PlacementError> {
        if round.id != self.round_id {
            return Err(PlacementError::WrongRound {
                expected: self.round_id,
                got: round.id,
            });
        }
        let available = wallet
            .map(|wallet| WalletSnapshot::new(wallet.total().saturating_sub(self.pending_stake()), 0));
        validate_stake(rules, RoundClock::phase_at(round, now_ms), amount, available.as_ref())?;
        validate_targets(rules, round, shape, &targets)?;

        let temp_id = TempId(self.next_temp_id);
        self.next_temp_id = self.next_temp_id.saturating_add(1);
        self.entries.push(Placement::Pending(LocalPlacement {
            temp_id,
            round_id: round.id,
            shape,
            targets,
            amount,
            created_at: now_ms,
        }));
        Ok(temp_id)
    }

    fn pending_slot(&self, temp_id: TempId) -> Option<usize> {
        self.entries.iter().position(|p| match p {
            Placement::Pending(local) => local.temp_id == temp_id,
            Placement::Confirmed(_) => false,
        })
    }

    /// Swap a pending entry for the backend's record.
    pub fn confirm(&mut self, temp_id: TempId, record: PlacementRecord) -> Result<(), PlacementError> {
        if record.round_id != self.round_id {
            return Err(PlacementError::WrongRound {
                expected: self.round_id,
                got: record.round_id,
            });
        }
        let slot = self
            .pending_slot(temp_id)
            .ok_or(PlacementError::UnknownTempId(temp_id))?;
        let already_listed = self
            .entries
            .iter()
            .any(|p| p.record().is_some_and(|existing| existing.id == record.id));
        if already_listed {
            // A refetch delivered the record before the acknowledgement.
            self.entries.remove(slot);
        } else {
            self.entries[slot] = Placement::Confirmed(record);
        }
        Ok(())
    }

    /// Drop a pending entry the backend refused.
    pub fn reject(&mut self, temp_id: TempId) -> Result<LocalPlacement, PlacementError> {
        let slot = self
            .pending_slot(temp_id)
            .ok_or(PlacementError::UnknownTempId(temp_id))?;
        match self.entries.remove(slot) {
            Placement::Pending(local) => Ok(local),
            Placement::Confirmed(_) => Err(PlacementError::UnknownTempId(temp_id)),
        }
    }

    /// Replace confirmed entries with a fresh server list.
    ///
    /// Records for other rounds are dropped. Pending entries are kept after the
    /// confirmed ones.
    pub fn replace_confirmed(&mut self, records: Vec<PlacementRecord>) {
        let round_id = self.round_id;
        let total = records.len();
        let mut entries: Vec<Placement> = records
            .into_iter()
            .filter(|record| record.round_id == round_id)
            .map(Placement::Confirmed)
            .collect();
        let dropped = total - entries.len();
        if dropped > 0 {
            debug!(round_id, dropped, "ignored placements for other rounds");
        }
        entries.extend(self.entries.drain(..).filter(|p| p.is_pending()));
        self.entries = entries;
    }

    /// Start tracking a new round with an empty book.
    pub fn reset(&mut self, round_id: u64) {
        self.round_id = round_id;
        self.entries.clear();
    }
}
