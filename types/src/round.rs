use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ContractError;

/// Game variants served by the round backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameType {
    NseRoulette,
    CryptoRoulette,
    UsaMarketRoulette,
    Aviator,
    CoinToss,
    WheelOfFortune,
    MiniMutualFund,
}

impl GameType {
    pub const ALL: [GameType; 7] = [
        GameType::NseRoulette,
        GameType::CryptoRoulette,
        GameType::UsaMarketRoulette,
        GameType::Aviator,
        GameType::CoinToss,
        GameType::WheelOfFortune,
        GameType::MiniMutualFund,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::NseRoulette => "NSE_ROULETTE",
            GameType::CryptoRoulette => "CRYPTO_ROULETTE",
            GameType::UsaMarketRoulette => "USA_MARKET_ROULETTE",
            GameType::Aviator => "AVIATOR",
            GameType::CoinToss => "COIN_TOSS",
            GameType::WheelOfFortune => "WHEEL_OF_FORTUNE",
            GameType::MiniMutualFund => "MINI_MUTUAL_FUND",
        }
    }

    /// Market-ticker roulette boards (NSE, crypto, USA).
    pub fn is_roulette(&self) -> bool {
        matches!(
            self,
            GameType::NseRoulette | GameType::CryptoRoulette | GameType::UsaMarketRoulette
        )
    }

    /// Games settled with an ordered leaderboard rather than a single winner.
    pub fn uses_ranked_outcome(&self) -> bool {
        matches!(self, GameType::MiniMutualFund)
    }

    pub fn has_wheel(&self) -> bool {
        matches!(self, GameType::WheelOfFortune)
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameType {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        GameType::ALL
            .into_iter()
            .find(|game| game.as_str() == normalized)
            .ok_or_else(|| ContractError::UnknownGameType(s.to_string()))
    }
}

/// A bettable slot within a round: a ticker, a plane, a coin side, a wheel segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketItem {
    pub id: u64,
    pub code: String,
    #[serde(rename = "codeName", default)]
    pub code_name: String,
    #[serde(default)]
    pub name: String,
    /// Ordinal board position.
    pub horse: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
}

/// Winner announcement attached to a round after resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Declaration {
    Single(u64),
    /// Leaderboard order, best first.
    Ranked(Vec<u64>),
}

impl Declaration {
    /// Build from the backend's winner fields. A non-empty `winning_ids` takes precedence.
    pub fn from_fields(winning_id: Option<u64>, winning_ids: Option<&[u64]>) -> Option<Self> {
        match (winning_ids, winning_id) {
            (Some(ids), _) if !ids.is_empty() => Some(Declaration::Ranked(ids.to_vec())),
            (_, Some(id)) => Some(Declaration::Single(id)),
            _ => None,
        }
    }

    pub fn ids(&self) -> &[u64] {
        match self {
            Declaration::Single(id) => std::slice::from_ref(id),
            Declaration::Ranked(ids) => ids,
        }
    }
}

/// One timed betting cycle.
///
/// Timestamps are Unix epoch milliseconds. The record is immutable once announced except
/// for the winner fields, which the backend attaches after resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub id: u64,
    #[serde(rename = "startTime")]
    pub start_time: u64,
    #[serde(rename = "placementEndTime")]
    pub placement_end_time: u64,
    #[serde(rename = "endTime")]
    pub end_time: u64,
    #[serde(default)]
    pub market: Vec<MarketItem>,
    #[serde(rename = "type")]
    pub game_type: GameType,
    #[serde(rename = "winningId", default, skip_serializing_if = "Option::is_none")]
    pub winning_id: Option<u64>,
    #[serde(rename = "winningIds", default, skip_serializing_if = "Option::is_none")]
    pub winning_ids: Option<Vec<u64>>,
}

impl RoundRecord {
    /// `start <= close <= end`.
    pub fn is_well_ordered(&self) -> bool {
        self.start_time <= self.placement_end_time && self.placement_end_time <= self.end_time
    }

    pub fn market_item(&self, id: u64) -> Option<&MarketItem> {
        self.market.iter().find(|item| item.id == id)
    }

    /// Index of the item within the ordered market list.
    pub fn market_index(&self, id: u64) -> Option<usize> {
        self.market.iter().position(|item| item.id == id)
    }

    /// Board position ("horse number") of the item.
    pub fn position_of(&self, id: u64) -> Option<u32> {
        self.market_item(id).map(|item| item.horse)
    }

    /// The resolved winner(s), if the backend has attached them.
    ///
    /// A non-empty `winningIds` takes precedence over `winningId`.
    pub fn winning_declaration(&self) -> Option<Declaration> {
        Declaration::from_fields(self.winning_id, self.winning_ids.as_deref())
    }

    /// Attach a late-arriving resolution.
    pub fn with_winner(mut self, declaration: Declaration) -> Self {
        match declaration {
            Declaration::Single(id) => {
                self.winning_id = Some(id);
                self.winning_ids = None;
            }
            Declaration::Ranked(ids) => {
                self.winning_id = ids.first().copied();
                self.winning_ids = Some(ids);
            }
        }
        self
    }
}
