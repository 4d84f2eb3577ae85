//! Deal command handler.
//!
//! Deals a single round on a freshly shuffled shoe and prints both hands.
//! The shuffle seed is always printed so the deal can be repeated with
//! `--seed`.

use crate::error::CliError;
use baccarat_engine::cards::format_cards;
use baccarat_engine::logger::{RoundLogger, RoundRecord};
use baccarat_engine::round::play_round;
use std::io::Write;

pub fn handle_deal_command(
    seed: Option<u64>,
    log: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let seed = seed.unwrap_or_else(rand::random);
    let outcome = play_round(Some(seed))?;

    writeln!(out, "Seed: {}", seed)?;
    writeln!(
        out,
        "Player: {} ({})",
        format_cards(outcome.player.cards()),
        outcome.player_score
    )?;
    writeln!(
        out,
        "Banker: {} ({})",
        format_cards(outcome.banker.cards()),
        outcome.banker_score
    )?;
    if outcome.natural {
        writeln!(out, "Natural")?;
    }
    writeln!(out, "Winner: {}", outcome.winner.label())?;
    if let Some(kind) = outcome.lucky_six.label() {
        writeln!(out, "Lucky Six: {}", kind)?;
    }

    if let Some(path) = log {
        let mut logger = RoundLogger::create(path)?;
        let id = logger.next_id();
        logger.write(&RoundRecord::from_outcome(id, &outcome))?;
    }
    Ok(())
}
