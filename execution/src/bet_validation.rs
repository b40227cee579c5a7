//! Stake validation at submission time.
//!
//! Stakes outside the configured limits are rejected with a user-facing error; they are
//! never clamped.

use roundtable_types::{BetShape, RoundRecord, WalletSnapshot};
use thiserror::Error;

use crate::round_clock::Phase;
use crate::rules::GameRules;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BetError {
    #[error("betting is closed for this round")]
    BettingClosed,
    #[error("stake must be greater than zero")]
    ZeroAmount,
    #[error("minimum stake is {min} (got {got})")]
    BelowMinimum { min: u64, got: u64 },
    #[error("maximum stake is {max} (got {got})")]
    AboveMaximum { max: u64, got: u64 },
    #[error("insufficient balance: {available} available, {needed} needed")]
    InsufficientBalance { available: u64, needed: u64 },
    #[error("bet must target at least one market item")]
    NoTargets,
    #[error("market item {0} is not part of this round")]
    UnknownTarget(u64),
    #[error("{0} bets are not offered in this game")]
    UnsupportedShape(BetShape),
}

/// Check a stake against phase, limits and the wallet.
pub fn validate_stake(
    rules: &GameRules,
    phase: Phase,
    amount: u64,
    wallet: Option<&WalletSnapshot>,
) -> Result<(), BetError> {
    if phase != Phase::AcceptingBets {
        return Err(BetError::BettingClosed);
    }
    if amount == 0 {
        return Err(BetError::ZeroAmount);
    }
    if amount < rules.min_bet {
        return Err(BetError::BelowMinimum {
            min: rules.min_bet,
            got: amount,
        });
    }
    if amount > rules.max_bet {
        return Err(BetError::AboveMaximum {
            max: rules.max_bet,
            got: amount,
        });
    }
    if let Some(wallet) = wallet {
        if !wallet.can_cover(amount) {
            return Err(BetError::InsufficientBalance {
                available: wallet.total(),
                needed: amount,
            });
        }
    }
    Ok(())
}

/// Check that a bet's shape is offered and that every target exists in the round.
pub fn validate_targets(
    rules: &GameRules,
    round: &RoundRecord,
    shape: BetShape,
    targets: &[u64],
) -> Result<(), BetError> {
    if rules.payout_bps(shape).is_none() {
        return Err(BetError::UnsupportedShape(shape));
    }
    if targets.is_empty() {
        return Err(BetError::NoTargets);
    }
    if let Some(unknown) = targets.iter().find(|id| round.market_item(**id).is_none()) {
        return Err(BetError::UnknownTarget(*unknown));
    }
    Ok(())
}
