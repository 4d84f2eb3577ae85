use baccarat_engine::cards::{parse_cards, Card};
use baccarat_engine::round::{play_round, LuckySix, Phase, Round, Winner};
use baccarat_engine::shoe::Shoe;

fn stacked(tokens: &str) -> Shoe {
    Shoe::from_cards(parse_cards(tokens).expect("valid tokens"))
}

fn cards(tokens: &str) -> Vec<Card> {
    parse_cards(tokens).unwrap()
}

#[test]
fn scenario_a_both_draw_to_a_tie() {
    // Deal order P, B, P, B, then player third, banker third
    let outcome = Round::new(stacked("S2,H4,S3,C10,D4,H5")).play().unwrap();
    assert_eq!(outcome.player_initial_score, 5);
    assert_eq!(outcome.banker_initial_score, 4);
    assert_eq!(outcome.player.cards(), cards("S2,S3,D4").as_slice());
    assert_eq!(outcome.banker.cards(), cards("H4,C10,H5").as_slice());
    assert_eq!(outcome.player_score, 9);
    assert_eq!(outcome.banker_score, 9);
    assert_eq!(outcome.winner, Winner::Tie);
    assert!(!outcome.natural);
}

#[test]
fn scenario_b_natural_skips_third_cards() {
    let mut round = Round::new(stacked("S3,D2,H5,C3,SK,HK"));
    round.deal().unwrap();
    assert!(round.is_natural());
    assert!(round.draw_third_cards().is_err());
    let outcome = round.determine().unwrap();
    assert_eq!(outcome.player.len(), 2);
    assert_eq!(outcome.banker.len(), 2);
    assert_eq!(outcome.player_score, 8);
    assert_eq!(outcome.banker_score, 5);
    assert_eq!(outcome.winner, Winner::Player);
    assert!(outcome.natural);
}

#[test]
fn scenario_c_two_card_lucky_six() {
    let outcome = Round::new(stacked("S2,DA,H3,C5,DK")).play().unwrap();
    assert_eq!(outcome.player.cards(), cards("S2,H3,DK").as_slice());
    assert_eq!(outcome.player_score, 5);
    assert_eq!(outcome.banker.len(), 2);
    assert_eq!(outcome.banker_score, 6);
    assert_eq!(outcome.winner, Winner::Banker);
    assert_eq!(outcome.lucky_six, LuckySix::TwoCard);
    assert!(outcome.is_lucky_six());
}

#[test]
fn three_card_lucky_six() {
    // Player 7 stands; banker 3 draws a 3 for 6
    let outcome = Round::new(stacked("S4,HA,S3,H2,C3")).play().unwrap();
    assert_eq!(outcome.player_score, 7);
    assert_eq!(outcome.player.len(), 2);
    assert_eq!(outcome.banker.len(), 3);
    assert_eq!(outcome.banker_score, 6);
    assert_eq!(outcome.winner, Winner::Player);
    assert_eq!(outcome.lucky_six, LuckySix::None);

    // Player 2 draws a 10 and stays 2; banker 3 draws a 3 for 6
    let outcome = Round::new(stacked("SA,HA,CA,H2,S10,C3")).play().unwrap();
    assert_eq!(outcome.player_score, 2);
    assert_eq!(outcome.banker_score, 6);
    assert_eq!(outcome.winner, Winner::Banker);
    assert_eq!(outcome.lucky_six, LuckySix::ThreeCard);
}

#[test]
fn player_standing_on_six_lets_banker_draw_on_five() {
    let outcome = Round::new(stacked("S3,H2,D3,H3,C2")).play().unwrap();
    assert_eq!(outcome.player.len(), 2);
    assert_eq!(outcome.banker.len(), 3);
    assert_eq!(outcome.banker_score, 7);
    assert_eq!(outcome.winner, Winner::Banker);
}

#[test]
fn round_invariants_hold_over_many_seeds() {
    for seed in 0..2_000u64 {
        let o = play_round(Some(seed)).unwrap();
        assert!(o.player_score <= 9 && o.banker_score <= 9, "seed {seed}");
        assert!((2..=3).contains(&o.player.len()), "seed {seed}");
        assert!((2..=3).contains(&o.banker.len()), "seed {seed}");
        if o.is_lucky_six() {
            assert_eq!(o.winner, Winner::Banker, "seed {seed}");
            assert_eq!(o.banker_score, 6, "seed {seed}");
        }
        if o.player_initial_score >= 8 || o.banker_initial_score >= 8 {
            assert!(o.natural, "seed {seed}");
            assert_eq!(o.player.len() + o.banker.len(), 4, "seed {seed}");
        }
        assert_eq!(o.seed, Some(seed));
    }
}

#[test]
fn phases_advance_in_order() {
    let mut round = Round::new(stacked("S2,H4,S3,C10,D4,H5"));
    assert_eq!(round.phase(), Phase::Created);
    round.deal().unwrap();
    assert_eq!(round.phase(), Phase::Dealt);
    assert!(round.determine().is_err(), "non-natural must draw first");
    round.draw_third_cards().unwrap();
    assert_eq!(round.phase(), Phase::ThirdCard);
    round.determine().unwrap();
    assert_eq!(round.phase(), Phase::Determined);
}
