use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::hand::Hand;
use crate::rules;
use crate::shoe::Shoe;

/// Lifecycle of a round. Transitions run strictly forward:
/// `Created -> Dealt -> [ThirdCard] -> Determined`. The third-card phase is
/// entered exactly when the initial deal is not a natural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Created,
    Dealt,
    ThirdCard,
    Determined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    Player,
    Banker,
    Tie,
}

impl Winner {
    pub fn label(self) -> &'static str {
        match self {
            Winner::Player => "Player",
            Winner::Banker => "Banker",
            Winner::Tie => "Tie",
        }
    }

    pub fn from_label(s: &str) -> Option<Winner> {
        match s {
            "Player" => Some(Winner::Player),
            "Banker" => Some(Winner::Banker),
            "Tie" => Some(Winner::Tie),
            _ => None,
        }
    }
}

/// Which Lucky Six, if any, a round produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LuckySix {
    None,
    TwoCard,
    ThreeCard,
}

impl LuckySix {
    pub fn is_triggered(self) -> bool {
        self != LuckySix::None
    }

    /// Stored label: `2cards` / `3cards`, nothing when not triggered.
    pub fn label(self) -> Option<&'static str> {
        match self {
            LuckySix::None => None,
            LuckySix::TwoCard => Some("2cards"),
            LuckySix::ThreeCard => Some("3cards"),
        }
    }

    pub fn from_label(label: Option<&str>) -> Option<LuckySix> {
        match label {
            None => Some(LuckySix::None),
            Some("2cards") => Some(LuckySix::TwoCard),
            Some("3cards") => Some(LuckySix::ThreeCard),
            Some(_) => None,
        }
    }
}

/// Classifies a finished round. Lucky Six needs a banker win on exactly 6.
pub fn classify(player_score: u8, banker_score: u8, banker_cards: usize) -> (Winner, LuckySix) {
    let winner = if player_score > banker_score {
        Winner::Player
    } else if banker_score > player_score {
        Winner::Banker
    } else {
        Winner::Tie
    };
    let lucky_six = match (winner, banker_score, banker_cards) {
        (Winner::Banker, 6, 2) => LuckySix::TwoCard,
        (Winner::Banker, 6, _) => LuckySix::ThreeCard,
        _ => LuckySix::None,
    };
    (winner, lucky_six)
}

/// The immutable result of a determined round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub player: Hand,
    pub banker: Hand,
    pub player_initial_score: u8,
    pub banker_initial_score: u8,
    pub player_score: u8,
    pub banker_score: u8,
    pub natural: bool,
    pub winner: Winner,
    pub lucky_six: LuckySix,
    /// Seed of the shuffle that produced the shoe, when it was shuffled.
    pub seed: Option<u64>,
}

impl RoundOutcome {
    pub fn is_lucky_six(&self) -> bool {
        self.lucky_six.is_triggered()
    }
}

/// Drives a single round over a shoe it owns exclusively.
///
/// # Examples
///
/// ```
/// use baccarat_engine::round::Round;
/// use baccarat_engine::shoe::Shoe;
///
/// let outcome = Round::new(Shoe::shuffled(Some(42))).play().expect("round completes");
/// assert!(outcome.player_score <= 9 && outcome.banker_score <= 9);
/// assert!((2..=3).contains(&outcome.player.len()));
/// ```
#[derive(Debug)]
pub struct Round {
    shoe: Shoe,
    phase: Phase,
    player: Option<Hand>,
    banker: Option<Hand>,
}

impl Round {
    pub fn new(shoe: Shoe) -> Self {
        Self {
            shoe,
            phase: Phase::Created,
            player: None,
            banker: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn player(&self) -> Option<&Hand> {
        self.player.as_ref()
    }

    pub fn banker(&self) -> Option<&Hand> {
        self.banker.as_ref()
    }

    fn hands_mut(&mut self) -> Result<(&mut Hand, &mut Hand), EngineError> {
        let phase = self.phase;
        match (self.player.as_mut(), self.banker.as_mut()) {
            (Some(p), Some(b)) => Ok((p, b)),
            _ => Err(EngineError::InvalidTransition {
                from: phase,
                to: Phase::Determined,
            }),
        }
    }

    /// Deals Player, Banker, Player, Banker.
    pub fn deal(&mut self) -> Result<(), EngineError> {
        if self.phase != Phase::Created {
            return Err(EngineError::InvalidTransition {
                from: self.phase,
                to: Phase::Dealt,
            });
        }
        let p1 = self.shoe.draw()?;
        let b1 = self.shoe.draw()?;
        let p2 = self.shoe.draw()?;
        let b2 = self.shoe.draw()?;
        self.player = Some(Hand::new(p1, p2));
        self.banker = Some(Hand::new(b1, b2));
        self.phase = Phase::Dealt;
        Ok(())
    }

    /// Whether the dealt hands form a natural. Only meaningful once dealt.
    pub fn is_natural(&self) -> bool {
        match (&self.player, &self.banker) {
            (Some(p), Some(b)) => rules::is_natural(p.initial_score(), b.initial_score()),
            _ => false,
        }
    }

    /// Applies the third-card rules. Refused on a natural, which goes
    /// straight to [`Round::determine`].
    pub fn draw_third_cards(&mut self) -> Result<(), EngineError> {
        if self.phase != Phase::Dealt || self.is_natural() {
            return Err(EngineError::InvalidTransition {
                from: self.phase,
                to: Phase::ThirdCard,
            });
        }
        self.phase = Phase::ThirdCard;

        let (player_score, banker_score) = {
            let (p, b) = self.hands_mut()?;
            (p.initial_score(), b.initial_score())
        };

        let player_third_pip = if rules::player_draws(player_score) {
            let card = self.shoe.draw()?;
            self.hands_mut()?.0.push_third(card)?;
            Some(card.pip())
        } else {
            None
        };

        if rules::banker_draws(banker_score, player_third_pip) {
            let card = self.shoe.draw()?;
            self.hands_mut()?.1.push_third(card)?;
        }
        Ok(())
    }

    /// Settles the winner and Lucky Six. Allowed from `Dealt` only for a
    /// natural; otherwise the third-card phase must come first.
    pub fn determine(&mut self) -> Result<RoundOutcome, EngineError> {
        let ready = match self.phase {
            Phase::Dealt => self.is_natural(),
            Phase::ThirdCard => true,
            _ => false,
        };
        if !ready {
            return Err(EngineError::InvalidTransition {
                from: self.phase,
                to: Phase::Determined,
            });
        }
        let natural = self.phase == Phase::Dealt;
        let (player, banker) = {
            let (p, b) = self.hands_mut()?;
            (p.clone(), b.clone())
        };
        self.phase = Phase::Determined;

        let (winner, lucky_six) = classify(player.score(), banker.score(), banker.len());
        Ok(RoundOutcome {
            player_initial_score: player.initial_score(),
            banker_initial_score: banker.initial_score(),
            player_score: player.score(),
            banker_score: banker.score(),
            natural,
            winner,
            lucky_six,
            seed: self.shoe.seed(),
            player,
            banker,
        })
    }

    /// Runs the round to completion.
    pub fn play(mut self) -> Result<RoundOutcome, EngineError> {
        self.deal()?;
        if !self.is_natural() {
            self.draw_third_cards()?;
        }
        self.determine()
    }
}

/// Convenience: one round on a freshly shuffled shoe.
pub fn play_round(seed: Option<u64>) -> Result<RoundOutcome, EngineError> {
    Round::new(Shoe::shuffled(seed)).play()
}
