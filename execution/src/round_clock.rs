//! Round clock for timed betting rounds.
//!
//! Derives the discrete phase of a round and its countdowns from the three timestamps on
//! a [`RoundRecord`] and the current wall-clock time. Nothing is accumulated between
//! calls: every reading is recomputed from absolute timestamps, so a caller that ticks at
//! roughly 1 Hz self-corrects after a suspended tab or a dropped frame.
//!
//! ## Phases
//!
//! 1. **AcceptingBets** - `now < bet-close`
//! 2. **BetsClosed** - `bet-close <= now < round-end`
//! 3. **Finished** - `now >= round-end`
//!
//! When bet-close equals round-end the `BetsClosed` phase has zero duration and the
//! clock goes straight from `AcceptingBets` to `Finished`.
//!
//! ## Malformed rounds
//!
//! A bet-close later than round-end is clamped to round-end, so countdowns never go
//! negative and the phase order is preserved. Nothing here fails.

use roundtable_types::RoundRecord;
use serde::Serialize;

const MS_PER_SECOND: u64 = 1_000;
const SECONDS_PER_MINUTE: u64 = 60;

/// Lifecycle stage of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AcceptingBets,
    BetsClosed,
    Finished,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::AcceptingBets => "accepting_bets",
            Phase::BetsClosed => "bets_closed",
            Phase::Finished => "finished",
        }
    }

    /// Whether the bet window has shut (bets closed or round over).
    pub fn is_closed(&self) -> bool {
        !matches!(self, Phase::AcceptingBets)
    }
}

/// One clock reading, as handed to the rendering layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ClockReading {
    pub phase: Phase,
    /// Milliseconds until bets close (0 once closed).
    pub place_time_left_ms: u64,
    /// Milliseconds until the round ends (0 once finished).
    pub game_time_left_ms: u64,
}

impl ClockReading {
    /// `mm:ss` countdown to bet-close.
    pub fn place_time_left(&self) -> String {
        format_countdown(self.place_time_left_ms)
    }

    /// `mm:ss` countdown to round-end.
    pub fn game_time_left(&self) -> String {
        format_countdown(self.game_time_left_ms)
    }
}

/// Effective phase boundaries after clamping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseBoundaries {
    pub bets_close_at_ms: u64,
    pub round_ends_at_ms: u64,
}

/// Stateless round clock.
pub struct RoundClock;

impl RoundClock {
    /// Effective bet-close and round-end for a round.
    pub fn phase_boundaries(round: &RoundRecord) -> PhaseBoundaries {
        PhaseBoundaries {
            bets_close_at_ms: round.placement_end_time.min(round.end_time),
            round_ends_at_ms: round.end_time,
        }
    }

    /// Phase of the round at `now_ms`.
    pub fn phase_at(round: &RoundRecord, now_ms: u64) -> Phase {
        let bounds = Self::phase_boundaries(round);
        if now_ms < bounds.bets_close_at_ms {
            Phase::AcceptingBets
        } else if now_ms < bounds.round_ends_at_ms {
            Phase::BetsClosed
        } else {
            Phase::Finished
        }
    }

    /// Full reading of the round at `now_ms`.
    pub fn at(round: &RoundRecord, now_ms: u64) -> ClockReading {
        let bounds = Self::phase_boundaries(round);
        ClockReading {
            phase: Self::phase_at(round, now_ms),
            place_time_left_ms: bounds.bets_close_at_ms.saturating_sub(now_ms),
            game_time_left_ms: bounds.round_ends_at_ms.saturating_sub(now_ms),
        }
    }
}

/// Format a millisecond countdown as `mm:ss`.
///
/// Sub-second remainders are truncated, so 59_999 ms renders as `00:59`. Minutes are not
/// wrapped at the hour.
pub fn format_countdown(ms: u64) -> String {
    let total_seconds = ms / MS_PER_SECOND;
    let minutes = total_seconds / SECONDS_PER_MINUTE;
    let seconds = total_seconds % SECONDS_PER_MINUTE;
    format!("{minutes:02}:{seconds:02}")
}
