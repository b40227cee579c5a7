//! Roundtable execution core.
//!
//! Pure computation behind the betting screens: the round clock, chip aggregation,
//! outcome resolution and the result dialog gate, plus the per-game rule table, stake
//! validation, the optimistic placement book and the round-scoped query cache.
//!
//! ## Determinism requirements
//! - Nothing here reads the wall clock; callers pass `now_ms`.
//! - No I/O. Inconsistent backend data is reported through `tracing` and surfaced as a
//!   status, never as a panic.
//! - Hash-based collections never influence output order.
//!
//! ## Minimal pipeline (example)
//! ```rust
//! use roundtable_execution::{aggregate_round, resolve, RoundClock, RuleBook};
//! # use roundtable_types::{GameType, MarketItem, PlacementRecord, BetShape, RoundRecord};
//! # let round = RoundRecord {
//! #     id: 1, start_time: 0, placement_end_time: 10_000, end_time: 15_000,
//! #     market: vec![MarketItem { id: 1, code: "HEAD".into(), code_name: String::new(),
//! #         name: String::new(), horse: 1, price: None, change_percent: None }],
//! #     game_type: GameType::CoinToss, winning_id: Some(1), winning_ids: None,
//! # };
//! # let placements: Vec<PlacementRecord> = vec![];
//! let rules = RuleBook::default();
//! let reading = RoundClock::at(&round, 12_000);
//! let chips = aggregate_round(&round, &placements);
//! let resolution = resolve(&round, &placements, rules.get(round.game_type));
//! # let _ = (reading, chips, resolution);
//! ```

pub mod bet_aggregator;
pub mod bet_validation;
pub mod cache;
pub mod outcome;
pub mod placements;
pub mod result_gate;
pub mod round_clock;
pub mod rules;

pub use bet_aggregator::{aggregate, aggregate_round, canonical_key, Chip, ChipKey};
pub use bet_validation::{validate_stake, validate_targets, BetError};
pub use cache::{CacheKey, EntityKind, QueryCache, RoundGuard};
pub use outcome::{
    angle_matches, resolve, wheel_target_angle, Resolution, ResolutionStatus, ResolvedPlacement,
};
pub use placements::{PlacementBook, PlacementError};
pub use result_gate::{GateState, ResultGate};
pub use round_clock::{format_countdown, ClockReading, Phase, PhaseBoundaries, RoundClock};
pub use rules::{GameRules, RuleBook, RulesError, RulesOverride};
