//! Data contracts shared across roundtable crates.
//!
//! Shapes mirror the JSON served by the round backend: round records with their market
//! list, the user's placements, and the wallet snapshot. Timestamps are Unix epoch
//! milliseconds and amounts are integer minor units.

mod constants;
mod placement;
mod round;
mod wallet;

pub use constants::*;
pub use placement::*;
pub use round::*;
pub use wallet::*;

use thiserror::Error;

/// Errors raised while interpreting backend contract values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("unknown game type: {0}")]
    UnknownGameType(String),
    #[error("unknown bet shape: {0}")]
    UnknownBetShape(String),
}

#[cfg(test)]
mod tests;
