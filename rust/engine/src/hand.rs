use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cards::Card;
use crate::errors::EngineError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("a hand holds 2 or 3 cards, got {0}")]
pub struct InvalidHand(pub usize);

/// A baccarat hand: the two initial cards plus an optional third.
///
/// The two-card minimum is enforced by construction and the three-card
/// maximum by [`Hand::push_third`], so a hand can never hold one card or
/// more than three.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Card>", into = "Vec<Card>")]
pub struct Hand {
    cards: Vec<Card>,
}

impl TryFrom<Vec<Card>> for Hand {
    type Error = InvalidHand;

    fn try_from(cards: Vec<Card>) -> Result<Self, Self::Error> {
        Hand::from_cards(&cards).ok_or(InvalidHand(cards.len()))
    }
}

impl From<Hand> for Vec<Card> {
    fn from(hand: Hand) -> Self {
        hand.cards
    }
}

impl Hand {
    pub fn new(first: Card, second: Card) -> Self {
        let mut cards = Vec::with_capacity(3);
        cards.push(first);
        cards.push(second);
        Self { cards }
    }

    /// Rebuilds a hand from stored cards, rejecting anything but 2 or 3 cards.
    pub fn from_cards(cards: &[Card]) -> Option<Self> {
        match cards.len() {
            2 | 3 => Some(Self {
                cards: cards.to_vec(),
            }),
            _ => None,
        }
    }

    pub fn push_third(&mut self, card: Card) -> Result<(), EngineError> {
        if self.cards.len() >= 3 {
            return Err(EngineError::HandFull);
        }
        self.cards.push(card);
        Ok(())
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn initial(&self) -> &[Card] {
        &self.cards[..2]
    }

    pub fn third(&self) -> Option<Card> {
        self.cards.get(2).copied()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Sum of pip values modulo 10.
    pub fn score(&self) -> u8 {
        score_of(&self.cards)
    }

    /// Score of the first two cards only.
    pub fn initial_score(&self) -> u8 {
        score_of(self.initial())
    }

    /// An initial two-card total of 8 or 9.
    pub fn is_natural(&self) -> bool {
        self.initial_score() >= 8
    }
}

pub fn score_of(cards: &[Card]) -> u8 {
    cards.iter().fold(0, |acc, c| (acc + c.pip()) % 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};

    fn c(suit: Suit, rank: Rank) -> Card {
        Card::new(suit, rank)
    }

    #[test]
    fn score_wraps_modulo_ten() {
        let hand = Hand::new(c(Suit::Spades, Rank::Seven), c(Suit::Hearts, Rank::Eight));
        assert_eq!(hand.score(), 5);
    }

    #[test]
    fn court_cards_count_zero() {
        let hand = Hand::new(c(Suit::Clubs, Rank::King), c(Suit::Diamonds, Rank::Ten));
        assert_eq!(hand.score(), 0);
        assert!(!hand.is_natural());
    }

    #[test]
    fn third_card_changes_final_but_not_initial_score() {
        let mut hand = Hand::new(c(Suit::Spades, Rank::Two), c(Suit::Spades, Rank::Three));
        hand.push_third(c(Suit::Diamonds, Rank::Four)).unwrap();
        assert_eq!(hand.initial_score(), 5);
        assert_eq!(hand.score(), 9);
        assert_eq!(hand.third(), Some(c(Suit::Diamonds, Rank::Four)));
    }

    #[test]
    fn deserializing_keeps_the_card_count_invariant() {
        let two = Hand::new(c(Suit::Spades, Rank::Nine), c(Suit::Hearts, Rank::Two));
        let json = serde_json::to_string(&two).unwrap();
        assert_eq!(serde_json::from_str::<Hand>(&json).unwrap(), two);

        let one = serde_json::to_string(&vec![c(Suit::Spades, Rank::Nine)]).unwrap();
        let err = serde_json::from_str::<Hand>(&one).unwrap_err();
        assert!(err.to_string().contains("got 1"), "{err}");

        let four = vec![c(Suit::Clubs, Rank::Ace); 4];
        assert_eq!(Hand::try_from(four), Err(InvalidHand(4)));
    }

    #[test]
    fn fourth_card_is_refused() {
        let mut hand = Hand::new(c(Suit::Spades, Rank::Ace), c(Suit::Spades, Rank::Two));
        hand.push_third(c(Suit::Spades, Rank::Three)).unwrap();
        assert_eq!(
            hand.push_third(c(Suit::Spades, Rank::Four)),
            Err(EngineError::HandFull)
        );
        assert_eq!(hand.len(), 3);
    }

    #[test]
    fn from_cards_enforces_two_or_three() {
        let one = [c(Suit::Hearts, Rank::Six)];
        assert!(Hand::from_cards(&one).is_none());
        let four = [c(Suit::Hearts, Rank::Six); 4];
        assert!(Hand::from_cards(&four).is_none());
        let two = [c(Suit::Hearts, Rank::Six), c(Suit::Hearts, Rank::Two)];
        assert_eq!(Hand::from_cards(&two).unwrap().score(), 8);
    }
}
