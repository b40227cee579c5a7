//! Per-game rule tables.
//!
//! Each game carries a payout table (basis points per bet shape, stake included), stake
//! limits, the number of paid leaderboard places, and the wheel stop tolerance. The
//! built-in defaults are the game constants; operator configuration layered on top with
//! [`RuleBook::with_overrides`] takes precedence shape by shape.

use std::collections::BTreeMap;

use roundtable_types::{
    BetShape, GameType, AVIATOR_PAYOUT_BPS, BINARY_PAYOUT_BPS, COLUMN_PAYOUT_BPS,
    CORNER_PAYOUT_BPS, DEFAULT_MAX_BET, DEFAULT_MIN_BET, DEFAULT_WHEEL_TOLERANCE_DEGREES,
    DEFAULT_WINNING_PLACES, DOZEN_PAYOUT_BPS, EVEN_MONEY_PAYOUT_BPS, FUND_PAYOUT_BPS,
    FUND_WINNING_PLACES, LINE_PAYOUT_BPS, PAYOUT_BPS_DENOMINATOR, SINGLE_PAYOUT_BPS,
    SPLIT_PAYOUT_BPS, STREET_PAYOUT_BPS, WHEEL_SEGMENT_PAYOUT_BPS,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RulesError {
    #[error("{game}: min_bet must be > 0")]
    ZeroMinimum { game: GameType },
    #[error("{game}: min_bet {min} exceeds max_bet {max}")]
    InvertedLimits { game: GameType, min: u64, max: u64 },
    #[error("{game}: payout for {shape} must be > 0")]
    ZeroPayout { game: GameType, shape: BetShape },
    #[error("{game}: wheel tolerance must be finite and within [0, 180] (got {got})")]
    InvalidTolerance { game: GameType, got: f64 },
    #[error("{game}: winning_places must be > 0")]
    ZeroWinningPlaces { game: GameType },
}

/// Rules for one game type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRules {
    pub game_type: GameType,
    pub min_bet: u64,
    pub max_bet: u64,
    /// Payout multiplier per shape in basis points, stake included.
    pub payouts: BTreeMap<BetShape, u32>,
    /// Leading ranked ids that count as winners.
    pub winning_places: u8,
    pub wheel_tolerance_degrees: f64,
}

impl GameRules {
    /// Built-in constants for a game.
    pub fn defaults(game_type: GameType) -> Self {
        let payouts: &[(BetShape, u32)] = match game_type {
            GameType::NseRoulette | GameType::CryptoRoulette | GameType::UsaMarketRoulette => &[
                (BetShape::Single, SINGLE_PAYOUT_BPS),
                (BetShape::Split, SPLIT_PAYOUT_BPS),
                (BetShape::Street, STREET_PAYOUT_BPS),
                (BetShape::Corner, CORNER_PAYOUT_BPS),
                (BetShape::Line, LINE_PAYOUT_BPS),
                (BetShape::Column, COLUMN_PAYOUT_BPS),
                (BetShape::Dozen, DOZEN_PAYOUT_BPS),
                (BetShape::Color, EVEN_MONEY_PAYOUT_BPS),
                (BetShape::Parity, EVEN_MONEY_PAYOUT_BPS),
                (BetShape::HighLow, EVEN_MONEY_PAYOUT_BPS),
                (BetShape::Up, BINARY_PAYOUT_BPS),
                (BetShape::Down, BINARY_PAYOUT_BPS),
            ],
            GameType::Aviator => &[(BetShape::Plane, AVIATOR_PAYOUT_BPS)],
            GameType::CoinToss => &[(BetShape::CoinSide, BINARY_PAYOUT_BPS)],
            GameType::WheelOfFortune => &[(BetShape::Segment, WHEEL_SEGMENT_PAYOUT_BPS)],
            GameType::MiniMutualFund => &[
                (BetShape::Fund, FUND_PAYOUT_BPS),
                (BetShape::Up, BINARY_PAYOUT_BPS),
                (BetShape::Down, BINARY_PAYOUT_BPS),
            ],
        };
        Self {
            game_type,
            min_bet: DEFAULT_MIN_BET,
            max_bet: DEFAULT_MAX_BET,
            payouts: payouts.iter().copied().collect(),
            winning_places: if game_type.uses_ranked_outcome() {
                FUND_WINNING_PLACES
            } else {
                DEFAULT_WINNING_PLACES
            },
            wheel_tolerance_degrees: DEFAULT_WHEEL_TOLERANCE_DEGREES,
        }
    }

    pub fn payout_bps(&self, shape: BetShape) -> Option<u32> {
        self.payouts.get(&shape).copied()
    }

    /// Gross return for a winning stake, floored to whole minor units.
    ///
    /// Shapes without a payout entry return nothing.
    pub fn gross_return(&self, shape: BetShape, amount: u64) -> Option<u64> {
        let bps = self.payout_bps(shape)?;
        let gross = (amount as u128) * (bps as u128) / (PAYOUT_BPS_DENOMINATOR as u128);
        Some(gross.min(u64::MAX as u128) as u64)
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        let game = self.game_type;
        if self.min_bet == 0 {
            return Err(RulesError::ZeroMinimum { game });
        }
        if self.min_bet > self.max_bet {
            return Err(RulesError::InvertedLimits {
                game,
                min: self.min_bet,
                max: self.max_bet,
            });
        }
        if let Some((shape, _)) = self.payouts.iter().find(|(_, bps)| **bps == 0) {
            return Err(RulesError::ZeroPayout {
                game,
                shape: *shape,
            });
        }
        let tolerance = self.wheel_tolerance_degrees;
        if !tolerance.is_finite() || !(0.0..=180.0).contains(&tolerance) {
            return Err(RulesError::InvalidTolerance {
                game,
                got: tolerance,
            });
        }
        if self.winning_places == 0 {
            return Err(RulesError::ZeroWinningPlaces { game });
        }
        Ok(())
    }
}

/// Operator overrides for one game. Unset fields keep the defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesOverride {
    pub game_type: Option<GameType>,
    #[serde(default)]
    pub min_bet: Option<u64>,
    #[serde(default)]
    pub max_bet: Option<u64>,
    #[serde(default)]
    pub payouts: BTreeMap<BetShape, u32>,
    #[serde(default)]
    pub winning_places: Option<u8>,
    #[serde(default)]
    pub wheel_tolerance_degrees: Option<f64>,
}

impl RulesOverride {
    fn apply(&self, rules: &mut GameRules) {
        if let Some(min_bet) = self.min_bet {
            rules.min_bet = min_bet;
        }
        if let Some(max_bet) = self.max_bet {
            rules.max_bet = max_bet;
        }
        for (shape, bps) in &self.payouts {
            rules.payouts.insert(*shape, *bps);
        }
        if let Some(places) = self.winning_places {
            rules.winning_places = places;
        }
        if let Some(tolerance) = self.wheel_tolerance_degrees {
            rules.wheel_tolerance_degrees = tolerance;
        }
    }
}

/// Rules for every game type.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleBook {
    games: BTreeMap<GameType, GameRules>,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self {
            games: GameType::ALL
                .into_iter()
                .map(|game| (game, GameRules::defaults(game)))
                .collect(),
        }
    }
}

impl RuleBook {
    /// Layer overrides over the defaults and validate the result.
    ///
    /// An override without a `game_type` applies to every game.
    pub fn with_overrides(overrides: &[RulesOverride]) -> Result<Self, RulesError> {
        let mut book = Self::default();
        for entry in overrides.iter().filter(|o| o.game_type.is_none()) {
            for rules in book.games.values_mut() {
                entry.apply(rules);
            }
        }
        for entry in overrides {
            let Some(game) = entry.game_type else {
                continue;
            };
            if let Some(rules) = book.games.get_mut(&game) {
                entry.apply(rules);
            }
        }
        for rules in book.games.values() {
            rules.validate()?;
        }
        Ok(book)
    }

    pub fn get(&self, game_type: GameType) -> &GameRules {
        // Every game type is populated at construction.
        &self.games[&game_type]
    }
}
