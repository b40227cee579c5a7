/// Basis-point denominator for payout multipliers (10_000 bps = 1.00x).
pub const PAYOUT_BPS_DENOMINATOR: u64 = 10_000;

/// Binary up/down and coin-side bets (1.96x, stake included).
pub const BINARY_PAYOUT_BPS: u32 = 19_600;

/// Aviator plane selection (1.99x, stake included).
pub const AVIATOR_PAYOUT_BPS: u32 = 19_900;

/// Roulette board shapes, stake included.
pub const SINGLE_PAYOUT_BPS: u32 = 360_000;
pub const SPLIT_PAYOUT_BPS: u32 = 180_000;
pub const STREET_PAYOUT_BPS: u32 = 120_000;
pub const CORNER_PAYOUT_BPS: u32 = 90_000;
pub const LINE_PAYOUT_BPS: u32 = 60_000;
pub const COLUMN_PAYOUT_BPS: u32 = 30_000;
pub const DOZEN_PAYOUT_BPS: u32 = 30_000;
pub const EVEN_MONEY_PAYOUT_BPS: u32 = 20_000;

/// Wheel segment pick on a 20-segment wheel (stake included).
pub const WHEEL_SEGMENT_PAYOUT_BPS: u32 = 190_000;

/// Mini mutual fund pick that finishes inside the paid places.
pub const FUND_PAYOUT_BPS: u32 = 29_000;

/// Default stake limits (minor units).
pub const DEFAULT_MIN_BET: u64 = 10;
pub const DEFAULT_MAX_BET: u64 = 100_000;

/// Angle within which the decorative wheel counts as stopped on its target.
pub const DEFAULT_WHEEL_TOLERANCE_DEGREES: f64 = 5.0;

/// Paid leaderboard places for ranked games.
pub const DEFAULT_WINNING_PLACES: u8 = 1;
pub const FUND_WINNING_PLACES: u8 = 3;

/// Round clock refresh interval.
pub const DEFAULT_TICK_MS: u64 = 1_000;
