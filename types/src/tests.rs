use super::*;
use std::str::FromStr;

fn market() -> Vec<MarketItem> {
    vec![
        MarketItem {
            id: 1,
            code: "RELIANCE".to_string(),
            code_name: "Reliance".to_string(),
            name: "Reliance Industries".to_string(),
            horse: 1,
            price: Some(2_950.5),
            change_percent: Some(-0.4),
        },
        MarketItem {
            id: 2,
            code: "TCS".to_string(),
            code_name: "TCS".to_string(),
            name: "Tata Consultancy".to_string(),
            horse: 2,
            price: None,
            change_percent: None,
        },
    ]
}

#[test]
fn test_round_record_decodes_backend_json() {
    let raw = r#"{
        "id": 42,
        "startTime": 1000,
        "placementEndTime": 31000,
        "endTime": 46000,
        "type": "NSE_ROULETTE",
        "market": [
            {"id": 7, "code": "INFY", "codeName": "Infosys", "name": "Infosys Ltd", "horse": 3, "price": 1500.25, "change_percent": 1.2}
        ]
    }"#;
    let round: RoundRecord = serde_json::from_str(raw).unwrap();
    assert_eq!(round.id, 42);
    assert_eq!(round.game_type, GameType::NseRoulette);
    assert_eq!(round.market.len(), 1);
    assert_eq!(round.position_of(7), Some(3));
    assert_eq!(round.winning_declaration(), None);
    assert!(round.is_well_ordered());
}

#[test]
fn test_winning_ids_take_precedence() {
    let round = RoundRecord {
        id: 1,
        start_time: 0,
        placement_end_time: 10,
        end_time: 20,
        market: market(),
        game_type: GameType::MiniMutualFund,
        winning_id: Some(1),
        winning_ids: Some(vec![2, 1]),
    };
    assert_eq!(
        round.winning_declaration(),
        Some(Declaration::Ranked(vec![2, 1]))
    );

    let single = RoundRecord {
        winning_ids: Some(vec![]),
        ..round
    };
    assert_eq!(single.winning_declaration(), Some(Declaration::Single(1)));
}

#[test]
fn test_with_winner_attaches_resolution() {
    let round = RoundRecord {
        id: 1,
        start_time: 0,
        placement_end_time: 10,
        end_time: 20,
        market: market(),
        game_type: GameType::CoinToss,
        winning_id: None,
        winning_ids: None,
    };
    let resolved = round.clone().with_winner(Declaration::Single(2));
    assert_eq!(resolved.winning_id, Some(2));
    assert_eq!(resolved.winning_declaration(), Some(Declaration::Single(2)));

    let ranked = round.with_winner(Declaration::Ranked(vec![2, 1]));
    assert_eq!(ranked.winning_id, Some(2));
    assert_eq!(ranked.winning_declaration().unwrap().ids(), &[2, 1]);
}

#[test]
fn test_malformed_round_is_not_well_ordered() {
    let round = RoundRecord {
        id: 1,
        start_time: 100,
        placement_end_time: 50,
        end_time: 200,
        market: vec![],
        game_type: GameType::Aviator,
        winning_id: None,
        winning_ids: None,
    };
    assert!(!round.is_well_ordered());
}

#[test]
fn test_placement_record_outcome() {
    let raw = r#"{"id": 9, "roundId": 42, "placementType": "SPLIT", "market": [4, 1], "amount": 250, "createdAt": 1200}"#;
    let mut record: PlacementRecord = serde_json::from_str(raw).unwrap();
    assert_eq!(record.placement_type, BetShape::Split);
    assert_eq!(record.outcome(), PlacementOutcome::Pending);

    record.is_winner = Some(true);
    assert_eq!(record.outcome(), PlacementOutcome::Pending);
    assert!(record.is_unpriced_win());

    record.amount_won = Some(4_500);
    assert_eq!(record.outcome(), PlacementOutcome::Won(4_500));
    assert!(!record.is_unpriced_win());

    record.is_winner = Some(false);
    assert_eq!(record.outcome(), PlacementOutcome::Lost);
}

#[test]
fn test_unknown_bet_shape_rejected() {
    let raw = r#"{"id": 9, "roundId": 42, "placementType": "PARLAY", "market": [1], "amount": 10, "createdAt": 0}"#;
    assert!(serde_json::from_str::<PlacementRecord>(raw).is_err());
    assert_eq!(
        BetShape::from_str("parlay"),
        Err(ContractError::UnknownBetShape("parlay".to_string()))
    );
}

#[test]
fn test_parse_names_loosely() {
    assert_eq!(BetShape::from_str("coin-side"), Ok(BetShape::CoinSide));
    assert_eq!(BetShape::from_str(" high low "), Ok(BetShape::HighLow));
    assert_eq!(GameType::from_str("wheel-of-fortune"), Ok(GameType::WheelOfFortune));
    assert!(GameType::from_str("blackjack").is_err());
    for game in GameType::ALL {
        assert_eq!(GameType::from_str(&game.to_string()), Ok(game));
    }
}

#[test]
fn test_placement_variants_share_stake_view() {
    let local = Placement::Pending(LocalPlacement {
        temp_id: TempId(1),
        round_id: 5,
        shape: BetShape::Single,
        targets: vec![3],
        amount: 100,
        created_at: 0,
    });
    let confirmed = Placement::Confirmed(PlacementRecord {
        id: 77,
        round_id: 5,
        placement_type: BetShape::Single,
        market: vec![3],
        amount: 100,
        created_at: 0,
        is_winner: None,
        amount_won: None,
    });
    assert!(local.is_pending());
    assert!(!confirmed.is_pending());
    assert_eq!(local.targets(), confirmed.targets());
    assert_eq!(local.amount(), confirmed.amount());
    assert_eq!(local.round_id(), confirmed.round_id());
    assert!(local.record().is_none());
    assert_eq!(confirmed.record().map(|r| r.id), Some(77));
}

#[test]
fn test_wallet_total_saturates() {
    let wallet = WalletSnapshot::new(u64::MAX, 10);
    assert_eq!(wallet.total(), u64::MAX);

    let wallet: WalletSnapshot = serde_json::from_str(r#"{"mainBalance": 500}"#).unwrap();
    assert_eq!(wallet.total(), 500);
    assert!(wallet.can_cover(500));
    assert!(!wallet.can_cover(501));
}

#[test]
fn test_declaration_from_fields() {
    assert_eq!(Declaration::from_fields(None, None), None);
    assert_eq!(Declaration::from_fields(None, Some(&[][..])), None);
    assert_eq!(
        Declaration::from_fields(Some(3), Some(&[][..])),
        Some(Declaration::Single(3))
    );
    assert_eq!(
        Declaration::from_fields(Some(3), Some(&[5, 3][..])),
        Some(Declaration::Ranked(vec![5, 3]))
    );
}
