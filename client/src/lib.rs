pub mod config;
pub mod session;

pub use config::{Config, ConfigError, ValidatedConfig};
pub use session::{Clock, Session, SessionState, SystemClock, Update, View};
use roundtable_execution::PlacementError;
use roundtable_types::GameType;
use thiserror::Error;

/// Error type for session operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no active round")]
    NoActiveRound,
    #[error("round {round_id} is a {got} round, session plays {expected}")]
    WrongGame {
        round_id: u64,
        expected: GameType,
        got: GameType,
    },
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("session closed")]
    SessionClosed,
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;
