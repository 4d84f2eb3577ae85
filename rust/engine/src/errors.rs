use thiserror::Error;

use crate::round::Phase;

/// Errors raised by the round engine. Apart from `InvalidCardToken`, which
/// comes from decoding stored records, these indicate a defect: correct
/// operation never produces them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid round transition from {from:?} to {to:?}")]
    InvalidTransition { from: Phase, to: Phase },
    #[error("Shoe exhausted")]
    ShoeExhausted,
    #[error("Hand already holds three cards")]
    HandFull,
    #[error("Invalid card token: {0:?}")]
    InvalidCardToken(String),
}
