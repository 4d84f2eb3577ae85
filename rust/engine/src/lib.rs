//! # baccarat-engine: Round Engine Core
//!
//! Deals single baccarat rounds under fixed casino rules and prices the
//! wagers placed on them. Everything here is synchronous and free of shared
//! state: a round owns its shoe, and payouts are plain values.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and `<Suit><Rank>` tokens
//! - [`shoe`] - 52-card shoe with seeded ChaCha20 shuffling
//! - [`hand`] - Two- or three-card hands and their scores
//! - [`rules`] - Natural check and the third-card draw table
//! - [`round`] - Round state machine, winner and Lucky Six
//! - [`payout`] - Wagers, payout table and the payout calculator
//! - [`audit`] - Re-derivation of a stored round from its cards
//! - [`logger`] - JSONL round records
//! - [`errors`] - Engine error type
//!
//! ## Quick Start
//!
//! ```rust
//! use baccarat_engine::payout::{calculate, PayoutTable, WagerSet};
//! use baccarat_engine::round::play_round;
//!
//! let outcome = play_round(Some(42)).expect("a round always completes");
//! let wagers = WagerSet { banker: 100, ..Default::default() };
//! let payouts = calculate(outcome.winner, outcome.lucky_six, &wagers, &PayoutTable::default());
//! assert_eq!(payouts.total_wagered(), 100);
//! ```
//!
//! ## Deterministic Deals
//!
//! ```rust
//! use baccarat_engine::round::play_round;
//!
//! // Same seed, same cards
//! assert_eq!(play_round(Some(7)).unwrap(), play_round(Some(7)).unwrap());
//! ```

pub mod audit;
pub mod cards;
pub mod errors;
pub mod hand;
pub mod logger;
pub mod payout;
pub mod round;
pub mod rules;
pub mod shoe;
