//! Replays a recorded round from its cards.
//!
//! The cards are stacked back into a shoe in deal order (the four initial
//! cards, then the player's third, then the banker's third) and the round is
//! played again. If the draw rules would have drawn a card the record lacks,
//! or left a recorded card undrawn, the record is inconsistent.

use std::collections::HashSet;

use thiserror::Error;

use crate::cards::Card;
use crate::errors::EngineError;
use crate::round::{Round, RoundOutcome};
use crate::shoe::Shoe;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("{side} hand holds {len} cards")]
    InvalidHand { side: &'static str, len: usize },
    #[error("card {0} appears more than once")]
    DuplicateCard(Card),
    #[error("draw rules require a third card the record does not have")]
    MissingThirdCard,
    #[error("{side} third card was recorded but the draw rules forbid it")]
    UnexpectedThirdCard { side: &'static str },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Replays the round described by `player` and `banker` (2 or 3 cards each).
pub fn replay(player: &[Card], banker: &[Card]) -> Result<RoundOutcome, ReplayError> {
    for (side, cards) in [("player", player), ("banker", banker)] {
        if !(2..=3).contains(&cards.len()) {
            return Err(ReplayError::InvalidHand {
                side,
                len: cards.len(),
            });
        }
    }

    let mut seen = HashSet::new();
    for &c in player.iter().chain(banker) {
        if !seen.insert(c) {
            return Err(ReplayError::DuplicateCard(c));
        }
    }

    let mut stacked = vec![player[0], banker[0], player[1], banker[1]];
    stacked.extend(player.get(2));
    stacked.extend(banker.get(2));

    let outcome = match Round::new(Shoe::from_cards(stacked)).play() {
        Ok(o) => o,
        Err(EngineError::ShoeExhausted) => return Err(ReplayError::MissingThirdCard),
        Err(e) => return Err(e.into()),
    };

    if outcome.player.len() != player.len() {
        return Err(ReplayError::UnexpectedThirdCard { side: "player" });
    }
    if outcome.banker.len() != banker.len() {
        return Err(ReplayError::UnexpectedThirdCard { side: "banker" });
    }
    Ok(outcome)
}
