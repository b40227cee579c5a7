use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ContractError;

/// The kind of wager. Determines payout multiplier and target matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetShape {
    Single,
    Split,
    Street,
    Corner,
    Line,
    Column,
    Dozen,
    Color,
    Parity,
    HighLow,
    Up,
    Down,
    Plane,
    CoinSide,
    Segment,
    Fund,
}

impl BetShape {
    pub const ALL: [BetShape; 16] = [
        BetShape::Single,
        BetShape::Split,
        BetShape::Street,
        BetShape::Corner,
        BetShape::Line,
        BetShape::Column,
        BetShape::Dozen,
        BetShape::Color,
        BetShape::Parity,
        BetShape::HighLow,
        BetShape::Up,
        BetShape::Down,
        BetShape::Plane,
        BetShape::CoinSide,
        BetShape::Segment,
        BetShape::Fund,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BetShape::Single => "SINGLE",
            BetShape::Split => "SPLIT",
            BetShape::Street => "STREET",
            BetShape::Corner => "CORNER",
            BetShape::Line => "LINE",
            BetShape::Column => "COLUMN",
            BetShape::Dozen => "DOZEN",
            BetShape::Color => "COLOR",
            BetShape::Parity => "PARITY",
            BetShape::HighLow => "HIGH_LOW",
            BetShape::Up => "UP",
            BetShape::Down => "DOWN",
            BetShape::Plane => "PLANE",
            BetShape::CoinSide => "COIN_SIDE",
            BetShape::Segment => "SEGMENT",
            BetShape::Fund => "FUND",
        }
    }
}

impl fmt::Display for BetShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BetShape {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        BetShape::ALL
            .into_iter()
            .find(|shape| shape.as_str() == normalized)
            .ok_or_else(|| ContractError::UnknownBetShape(s.to_string()))
    }
}

/// Settlement state of a single placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "amount", rename_all = "snake_case")]
pub enum PlacementOutcome {
    Pending,
    Won(u64),
    Lost,
}

/// A confirmed user bet as reported by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub id: u64,
    #[serde(rename = "roundId")]
    pub round_id: u64,
    #[serde(rename = "placementType")]
    pub placement_type: BetShape,
    /// Targeted market item ids.
    pub market: Vec<u64>,
    pub amount: u64,
    #[serde(rename = "createdAt")]
    pub created_at: u64,
    #[serde(rename = "isWinner", default, skip_serializing_if = "Option::is_none")]
    pub is_winner: Option<bool>,
    #[serde(rename = "amountWon", default, skip_serializing_if = "Option::is_none")]
    pub amount_won: Option<u64>,
}

impl PlacementRecord {
    /// Outcome attached by the backend, if any.
    ///
    /// A win reported without `amountWon` stays `Pending`: the amount is unknown here and
    /// must be priced from the game's payout table (see [`Self::is_unpriced_win`]).
    pub fn outcome(&self) -> PlacementOutcome {
        match (self.is_winner, self.amount_won) {
            (Some(true), Some(amount)) => PlacementOutcome::Won(amount),
            (Some(false), _) => PlacementOutcome::Lost,
            _ => PlacementOutcome::Pending,
        }
    }

    /// The backend flagged this placement as a winner but sent no amount.
    pub fn is_unpriced_win(&self) -> bool {
        self.is_winner == Some(true) && self.amount_won.is_none()
    }
}

/// Client-generated identifier for a bet awaiting backend confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TempId(pub u64);

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmp-{}", self.0)
    }
}

/// A bet submitted locally and not yet acknowledged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LocalPlacement {
    pub temp_id: TempId,
    pub round_id: u64,
    pub shape: BetShape,
    pub targets: Vec<u64>,
    pub amount: u64,
    pub created_at: u64,
}

/// Optimistically displayed placement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Placement {
    Pending(LocalPlacement),
    Confirmed(PlacementRecord),
}

impl Placement {
    pub fn is_pending(&self) -> bool {
        matches!(self, Placement::Pending(_))
    }

    pub fn record(&self) -> Option<&PlacementRecord> {
        match self {
            Placement::Confirmed(record) => Some(record),
            Placement::Pending(_) => None,
        }
    }
}

/// Common read access over anything that stakes an amount on a set of targets.
pub trait Stake {
    fn round_id(&self) -> u64;
    fn shape(&self) -> BetShape;
    fn targets(&self) -> &[u64];
    fn amount(&self) -> u64;
}

impl Stake for PlacementRecord {
    fn round_id(&self) -> u64 {
        self.round_id
    }

    fn shape(&self) -> BetShape {
        self.placement_type
    }

    fn targets(&self) -> &[u64] {
        &self.market
    }

    fn amount(&self) -> u64 {
        self.amount
    }
}

impl Stake for LocalPlacement {
    fn round_id(&self) -> u64 {
        self.round_id
    }

    fn shape(&self) -> BetShape {
        self.shape
    }

    fn targets(&self) -> &[u64] {
        &self.targets
    }

    fn amount(&self) -> u64 {
        self.amount
    }
}

impl Stake for Placement {
    fn round_id(&self) -> u64 {
        match self {
            Placement::Pending(local) => local.round_id(),
            Placement::Confirmed(record) => record.round_id(),
        }
    }

    fn shape(&self) -> BetShape {
        match self {
            Placement::Pending(local) => local.shape(),
            Placement::Confirmed(record) => record.shape(),
        }
    }

    fn targets(&self) -> &[u64] {
        match self {
            Placement::Pending(local) => local.targets(),
            Placement::Confirmed(record) => record.targets(),
        }
    }

    fn amount(&self) -> u64 {
        match self {
            Placement::Pending(local) => local.amount(),
            Placement::Confirmed(record) => record.amount(),
        }
    }
}
