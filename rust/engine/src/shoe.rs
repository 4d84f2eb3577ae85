use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};
use crate::errors::EngineError;

/// The card source for a single round. A shoe is owned by exactly one round
/// and only ever shrinks from the front.
#[derive(Debug, Clone)]
pub struct Shoe {
    cards: Vec<Card>,
    position: usize,
    seed: Option<u64>,
}

impl Shoe {
    /// 52 cards in base order, unshuffled.
    pub fn new() -> Self {
        Self {
            cards: full_deck(),
            position: 0,
            seed: None,
        }
    }

    /// A freshly shuffled shoe. When `seed` is `None` a random one is drawn
    /// so the order can still be reproduced from the recorded seed.
    pub fn shuffled(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        let mut shoe = Self::new();
        shoe.shuffle_with_seed(seed);
        shoe
    }

    /// A stacked shoe that deals `cards` in the given order.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self {
            cards,
            position: 0,
            seed: None,
        }
    }

    /// Uniform Fisher-Yates permutation of the full 52 cards driven by ChaCha20.
    pub fn shuffle_with_seed(&mut self, seed: u64) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        self.cards = full_deck();
        self.cards.shuffle(&mut rng);
        self.position = 0;
        self.seed = Some(seed);
    }

    pub fn draw(&mut self) -> Result<Card, EngineError> {
        let card = self
            .cards
            .get(self.position)
            .copied()
            .ok_or(EngineError::ShoeExhausted)?;
        self.position += 1;
        Ok(card)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl Default for Shoe {
    fn default() -> Self {
        Self::new()
    }
}
