//! Third-card rules.
//!
//! The banker's decision after the player has drawn is a fixed table indexed
//! by banker score; each row is a bitmask over the pip value (0-9) of the
//! player's third card. Bit `p` set means the banker draws.

/// Rows are banker scores 0..=9, bit 0 is pip 0.
const BANKER_DRAW_TABLE: [u16; 10] = [
    0b11_1111_1111, // 0: always
    0b11_1111_1111, // 1: always
    0b11_1111_1111, // 2: always
    0b10_1111_1111, // 3: all but 8
    0b00_1111_1100, // 4: 2-7
    0b00_1111_0000, // 5: 4-7
    0b00_1100_0000, // 6: 6-7
    0b00_0000_0000, // 7: never
    0b00_0000_0000, // 8: never
    0b00_0000_0000, // 9: never
];

/// Either side holding 8 or 9 after the initial deal ends the draw phase.
pub fn is_natural(player_score: u8, banker_score: u8) -> bool {
    player_score >= 8 || banker_score >= 8
}

/// The player draws a third card on 0-5 and stands on 6-7.
pub fn player_draws(player_score: u8) -> bool {
    player_score <= 5
}

/// Banker decision given its two-card score and the pip of the player's
/// third card (`None` when the player stood).
pub fn banker_draws(banker_score: u8, player_third_pip: Option<u8>) -> bool {
    match player_third_pip {
        None => banker_score <= 5,
        Some(pip) => banker_draws_after_player(banker_score, pip),
    }
}

/// Table lookup for the case where the player drew.
pub fn banker_draws_after_player(banker_score: u8, player_third_pip: u8) -> bool {
    let Some(row) = BANKER_DRAW_TABLE.get(usize::from(banker_score)) else {
        return false;
    };
    player_third_pip < 10 && row & (1 << player_third_pip) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_published_rows() {
        for pip in 0..10u8 {
            for score in 0..=2u8 {
                assert!(banker_draws_after_player(score, pip));
            }
            assert_eq!(banker_draws_after_player(3, pip), pip != 8);
            assert_eq!(banker_draws_after_player(4, pip), (2..=7).contains(&pip));
            assert_eq!(banker_draws_after_player(5, pip), (4..=7).contains(&pip));
            assert_eq!(banker_draws_after_player(6, pip), pip == 6 || pip == 7);
            for score in 7..=9u8 {
                assert!(!banker_draws_after_player(score, pip));
            }
        }
    }

    #[test]
    fn banker_follows_own_score_when_player_stands() {
        for score in 0..=5u8 {
            assert!(banker_draws(score, None));
        }
        for score in 6..=9u8 {
            assert!(!banker_draws(score, None));
        }
    }

    #[test]
    fn player_draw_threshold() {
        assert!(player_draws(0));
        assert!(player_draws(5));
        assert!(!player_draws(6));
        assert!(!player_draws(7));
    }

    #[test]
    fn naturals() {
        assert!(is_natural(8, 0));
        assert!(is_natural(0, 9));
        assert!(!is_natural(7, 7));
    }

    #[test]
    fn out_of_range_inputs_never_draw() {
        assert!(!banker_draws_after_player(10, 3));
        assert!(!banker_draws_after_player(0, 10));
    }
}
