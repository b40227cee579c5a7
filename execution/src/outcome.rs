//! Outcome resolution for settled rounds.
//!
//! Maps the backend's winner declaration onto the round's market, marks the user's
//! placements as won or lost, prices winnings from the game's payout table and derives
//! the net result. For the wheel game it also computes the angle the wheel must stop at
//! so the highlighted segment agrees with the declared winner.
//!
//! A declaration naming an id that is not in the round's market is a backend
//! inconsistency: nothing is marked, every placement stays pending and the mismatch is
//! logged. Resolution never guesses.

use std::collections::BTreeSet;

use roundtable_types::{BetShape, Declaration, PlacementOutcome, PlacementRecord, RoundRecord};
use serde::Serialize;
use tracing::warn;

use crate::rules::GameRules;

const FULL_TURN_DEGREES: f64 = 360.0;

/// Overall state of a round's resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// No winner declared yet.
    Pending,
    Resolved,
    /// The declaration references ids missing from the round's market.
    Inconsistent,
}

/// Settlement view of one placement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedPlacement {
    pub id: u64,
    pub shape: BetShape,
    pub targets: Vec<u64>,
    pub amount: u64,
    pub outcome: PlacementOutcome,
}

impl ResolvedPlacement {
    pub fn is_winner(&self) -> bool {
        matches!(self.outcome, PlacementOutcome::Won(_))
    }

    /// Gross amount returned (0 unless won).
    pub fn amount_won(&self) -> u64 {
        match self.outcome {
            PlacementOutcome::Won(amount) => amount,
            _ => 0,
        }
    }
}

/// Result of resolving a round for one user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Resolution {
    pub round_id: u64,
    pub status: ResolutionStatus,
    /// Market ids to highlight as winners.
    pub winners: BTreeSet<u64>,
    /// Full declared ranking for leaderboard games (best first).
    pub ranking: Vec<u64>,
    pub placements: Vec<ResolvedPlacement>,
    /// `sum(amount_won) - sum(amount)`, once every placement is settled.
    pub net_result: Option<i64>,
    /// Wheel stop angle for the declared segment.
    pub target_angle_degrees: Option<f64>,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.status == ResolutionStatus::Resolved
    }

    pub fn is_inconsistent(&self) -> bool {
        self.status == ResolutionStatus::Inconsistent
    }

    pub fn total_placed(&self) -> u64 {
        self.placements
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.amount))
    }

    pub fn total_won(&self) -> u64 {
        self.placements
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.amount_won()))
    }

    fn unresolved(
        round: &RoundRecord,
        placements: &[&PlacementRecord],
        status: ResolutionStatus,
    ) -> Self {
        Self {
            round_id: round.id,
            status,
            winners: BTreeSet::new(),
            ranking: Vec::new(),
            placements: placements
                .iter()
                .map(|record| ResolvedPlacement {
                    id: record.id,
                    shape: record.placement_type,
                    targets: record.market.clone(),
                    amount: record.amount,
                    outcome: PlacementOutcome::Pending,
                })
                .collect(),
            net_result: None,
            target_angle_degrees: None,
        }
    }
}

/// Resolve a round against the user's confirmed placements.
///
/// Placements for other rounds are ignored. When the backend has already attached a
/// win/loss to a placement that verdict is reported as-is; otherwise it is computed from
/// the winner set and `rules`. A backend win without an amount is priced from `rules`.
pub fn resolve(
    round: &RoundRecord,
    placements: &[PlacementRecord],
    rules: &GameRules,
) -> Resolution {
    let own: Vec<&PlacementRecord> = placements
        .iter()
        .filter(|p| p.round_id == round.id)
        .collect();

    let Some(declaration) = round.winning_declaration() else {
        return Resolution::unresolved(round, &own, ResolutionStatus::Pending);
    };

    let missing: Vec<u64> = declaration
        .ids()
        .iter()
        .copied()
        .filter(|id| round.market_item(*id).is_none())
        .collect();
    if !missing.is_empty() {
        warn!(
            round_id = round.id,
            game = round.game_type.as_str(),
            ?missing,
            "winning id not present in round market"
        );
        return Resolution::unresolved(round, &own, ResolutionStatus::Inconsistent);
    }

    let (winners, ranking): (BTreeSet<u64>, Vec<u64>) = match &declaration {
        Declaration::Single(id) => ([*id].into_iter().collect(), Vec::new()),
        Declaration::Ranked(ids) => (
            ids.iter().take(rules.winning_places as usize).copied().collect(),
            ids.clone(),
        ),
    };

    let mut fully_priced = true;
    let resolved: Vec<ResolvedPlacement> = own
        .iter()
        .map(|record| {
            let priced = match record.outcome() {
                PlacementOutcome::Pending if record.is_unpriced_win() => rules
                    .gross_return(record.placement_type, record.amount)
                    .map(PlacementOutcome::Won),
                PlacementOutcome::Pending => settle(record, &winners, rules),
                reported => Some(reported),
            };
            let outcome = priced.unwrap_or_else(|| {
                warn!(
                    round_id = round.id,
                    placement = record.id,
                    shape = %record.placement_type,
                    "no payout configured for winning shape"
                );
                fully_priced = false;
                PlacementOutcome::Pending
            });
            ResolvedPlacement {
                id: record.id,
                shape: record.placement_type,
                targets: record.market.clone(),
                amount: record.amount,
                outcome,
            }
        })
        .collect();

    let net_result = fully_priced.then(|| {
        let placed: i128 = resolved.iter().map(|p| p.amount as i128).sum();
        let won: i128 = resolved.iter().map(|p| p.amount_won() as i128).sum();
        clamp_i64(won - placed)
    });

    let target_angle_degrees = match declaration {
        Declaration::Single(id) if round.game_type.has_wheel() => round
            .market_index(id)
            .and_then(|index| wheel_target_angle(index, round.market.len())),
        _ => None,
    };

    Resolution {
        round_id: round.id,
        status: ResolutionStatus::Resolved,
        winners,
        ranking,
        placements: resolved,
        net_result,
        target_angle_degrees,
    }
}

/// Settle one placement; `None` when a winning shape has no payout entry.
fn settle(
    record: &PlacementRecord,
    winners: &BTreeSet<u64>,
    rules: &GameRules,
) -> Option<PlacementOutcome> {
    let hit = record.market.iter().any(|id| winners.contains(id));
    if !hit {
        return Some(PlacementOutcome::Lost);
    }
    rules
        .gross_return(record.placement_type, record.amount)
        .map(PlacementOutcome::Won)
}

/// Stop angle for segment `index` of a `count`-segment wheel.
///
/// `(360 - ((index / count) * 360 + (360 / count) / 2)) mod 360`, i.e. the rotation that
/// brings the centre of the segment under a pointer at 0 degrees.
pub fn wheel_target_angle(index: usize, count: usize) -> Option<f64> {
    if count == 0 || index >= count {
        return None;
    }
    let segment = FULL_TURN_DEGREES / count as f64;
    let centre = index as f64 * segment + segment / 2.0;
    Some((FULL_TURN_DEGREES - centre).rem_euclid(FULL_TURN_DEGREES))
}

/// Whether `current` is within `tolerance` degrees of `target`, measured around the circle.
pub fn angle_matches(current: f64, target: f64, tolerance: f64) -> bool {
    if !current.is_finite() || !target.is_finite() {
        return false;
    }
    let diff = (current - target).rem_euclid(FULL_TURN_DEGREES);
    diff.min(FULL_TURN_DEGREES - diff) <= tolerance
}

fn clamp_i64(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_types::{GameType, MarketItem, BINARY_PAYOUT_BPS};

    fn item(id: u64, horse: u32) -> MarketItem {
        MarketItem {
            id,
            code: format!("M{id}"),
            code_name: String::new(),
            name: String::new(),
            horse,
            price: None,
            change_percent: None,
        }
    }

    fn round(game_type: GameType, market: Vec<MarketItem>) -> RoundRecord {
        RoundRecord {
            id: 7,
            start_time: 0,
            placement_end_time: 30_000,
            end_time: 45_000,
            market,
            game_type,
            winning_id: None,
            winning_ids: None,
        }
    }

    fn placement(id: u64, shape: BetShape, market: Vec<u64>, amount: u64) -> PlacementRecord {
        PlacementRecord {
            id,
            round_id: 7,
            placement_type: shape,
            market,
            amount,
            created_at: 0,
            is_winner: None,
            amount_won: None,
        }
    }

    fn binary_rules() -> GameRules {
        let mut rules = GameRules::defaults(GameType::CoinToss);
        rules.payouts.insert(BetShape::Single, BINARY_PAYOUT_BPS);
        rules
    }

    #[test]
    fn test_single_winner_resolution() {
        let r = round(GameType::CoinToss, vec![item(1, 1), item(2, 2), item(3, 3)])
            .with_winner(Declaration::Single(2));
        let placements = vec![
            placement(10, BetShape::Single, vec![2], 500),
            placement(11, BetShape::Single, vec![1], 300),
        ];
        let resolution = resolve(&r, &placements, &binary_rules());

        assert!(resolution.is_resolved());
        assert_eq!(resolution.winners, BTreeSet::from([2]));
        assert!(resolution.placements[0].is_winner());
        assert_eq!(resolution.placements[0].amount_won(), 980);
        assert!(!resolution.placements[1].is_winner());
        assert_eq!(resolution.placements[1].amount_won(), 0);
        assert_eq!(resolution.placements[1].outcome, PlacementOutcome::Lost);
        assert_eq!(resolution.net_result, Some(180));
        assert_eq!(resolution.total_placed(), 800);
        assert_eq!(resolution.total_won(), 980);
        assert_eq!(resolution.target_angle_degrees, None);
    }

    #[test]
    fn test_no_declaration_is_pending() {
        let r = round(GameType::CoinToss, vec![item(1, 1)]);
        let placements = vec![placement(10, BetShape::CoinSide, vec![1], 100)];
        let resolution = resolve(&r, &placements, &binary_rules());
        assert_eq!(resolution.status, ResolutionStatus::Pending);
        assert!(resolution.winners.is_empty());
        assert_eq!(resolution.placements[0].outcome, PlacementOutcome::Pending);
        assert_eq!(resolution.net_result, None);
    }

    #[test]
    fn test_unknown_winner_is_inconsistent() {
        let r = round(GameType::CoinToss, vec![item(1, 1), item(2, 2)])
            .with_winner(Declaration::Single(99));
        let placements = vec![placement(10, BetShape::CoinSide, vec![1], 100)];
        let resolution = resolve(&r, &placements, &binary_rules());
        assert!(resolution.is_inconsistent());
        assert!(resolution.winners.is_empty());
        assert_eq!(resolution.placements.len(), 1);
        assert_eq!(resolution.placements[0].outcome, PlacementOutcome::Pending);
        assert_eq!(resolution.net_result, None);
    }

    #[test]
    fn test_split_wins_on_either_target() {
        let market = (1..=6).map(|id| item(id, id as u32)).collect();
        let r = round(GameType::NseRoulette, market).with_winner(Declaration::Single(4));
        let placements = vec![
            placement(1, BetShape::Split, vec![3, 4], 100),
            placement(2, BetShape::Single, vec![4], 10),
            placement(3, BetShape::Color, vec![1, 3, 5], 50),
        ];
        let rules = GameRules::defaults(GameType::NseRoulette);
        let resolution = resolve(&r, &placements, &rules);
        assert_eq!(resolution.placements[0].amount_won(), 1_800);
        assert_eq!(resolution.placements[1].amount_won(), 360);
        assert!(!resolution.placements[2].is_winner());
        assert_eq!(resolution.net_result, Some(1_800 + 360 - 160));
    }

    #[test]
    fn test_ranked_declaration_respects_paid_places() {
        let market = (1..=5).map(|id| item(id, id as u32)).collect();
        let r = round(GameType::MiniMutualFund, market)
            .with_winner(Declaration::Ranked(vec![4, 2, 5, 1, 3]));
        let placements = vec![
            placement(1, BetShape::Fund, vec![5], 100),
            placement(2, BetShape::Fund, vec![1], 100),
        ];
        let rules = GameRules::defaults(GameType::MiniMutualFund);
        let resolution = resolve(&r, &placements, &rules);
        assert_eq!(resolution.winners, BTreeSet::from([2, 4, 5]));
        assert_eq!(resolution.ranking, vec![4, 2, 5, 1, 3]);
        assert_eq!(resolution.placements[0].amount_won(), 290);
        assert!(!resolution.placements[1].is_winner());
        assert_eq!(resolution.net_result, Some(90));
    }

    #[test]
    fn test_ranked_with_unknown_id_is_inconsistent() {
        let market = (1..=3).map(|id| item(id, id as u32)).collect();
        let r = round(GameType::MiniMutualFund, market)
            .with_winner(Declaration::Ranked(vec![1, 8, 2]));
        let resolution = resolve(&r, &[], &GameRules::defaults(GameType::MiniMutualFund));
        assert!(resolution.is_inconsistent());
        assert!(resolution.ranking.is_empty());
    }

    #[test]
    fn test_backend_verdict_is_reported() {
        let r = round(GameType::CoinToss, vec![item(1, 1), item(2, 2)])
            .with_winner(Declaration::Single(1));
        let mut settled = placement(10, BetShape::CoinSide, vec![1], 100);
        settled.is_winner = Some(true);
        settled.amount_won = Some(199);
        let resolution = resolve(&r, &[settled], &binary_rules());
        assert_eq!(resolution.placements[0].outcome, PlacementOutcome::Won(199));
        assert_eq!(resolution.net_result, Some(99));
    }

    #[test]
    fn test_backend_win_without_amount_is_priced() {
        let r = round(GameType::CoinToss, vec![item(1, 1), item(2, 2)])
            .with_winner(Declaration::Single(1));
        let mut settled = placement(10, BetShape::Single, vec![1], 500);
        settled.is_winner = Some(true);
        let resolution = resolve(&r, &[settled], &binary_rules());
        assert_eq!(resolution.placements[0].outcome, PlacementOutcome::Won(980));
        assert_eq!(resolution.net_result, Some(480));
    }

    #[test]
    fn test_unpriced_winning_shape_stays_pending() {
        let r = round(GameType::CoinToss, vec![item(1, 1)]).with_winner(Declaration::Single(1));
        let placements = vec![placement(10, BetShape::Plane, vec![1], 100)];
        let resolution = resolve(&r, &placements, &GameRules::defaults(GameType::CoinToss));
        assert!(resolution.is_resolved());
        assert_eq!(resolution.placements[0].outcome, PlacementOutcome::Pending);
        assert_eq!(resolution.net_result, None);
    }

    #[test]
    fn test_other_round_placements_ignored() {
        let r = round(GameType::CoinToss, vec![item(1, 1)]).with_winner(Declaration::Single(1));
        let mut other = placement(10, BetShape::CoinSide, vec![1], 100);
        other.round_id = 6;
        let resolution = resolve(&r, &[other], &binary_rules());
        assert!(resolution.placements.is_empty());
        assert_eq!(resolution.net_result, Some(0));
    }

    #[test]
    fn test_wheel_target_angle() {
        assert_eq!(wheel_target_angle(0, 20), Some(351.0));
        assert_eq!(wheel_target_angle(10, 20), Some(171.0));
        assert_eq!(wheel_target_angle(19, 20), Some(9.0));
        assert_eq!(wheel_target_angle(0, 1), Some(180.0));
        assert_eq!(wheel_target_angle(0, 0), None);
        assert_eq!(wheel_target_angle(20, 20), None);
    }

    #[test]
    fn test_wheel_resolution_carries_angle() {
        let market = (100..120).map(|id| item(id, (id - 99) as u32)).collect();
        let r = round(GameType::WheelOfFortune, market).with_winner(Declaration::Single(110));
        let placements = vec![placement(1, BetShape::Segment, vec![110], 10)];
        let resolution = resolve(&r, &placements, &GameRules::defaults(GameType::WheelOfFortune));
        assert_eq!(resolution.target_angle_degrees, Some(171.0));
        assert_eq!(resolution.placements[0].amount_won(), 190);
    }

    #[test]
    fn test_angle_matches() {
        assert!(angle_matches(351.0, 351.0, 5.0));
        assert!(angle_matches(355.9, 351.0, 5.0));
        assert!(!angle_matches(357.0, 351.0, 5.0));
        assert!(angle_matches(2.0, 358.0, 5.0));
        assert!(angle_matches(720.0 + 171.0, 171.0, 0.5));
        assert!(!angle_matches(f64::NAN, 171.0, 5.0));
    }
}
