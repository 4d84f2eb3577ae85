//! `bet`: admit wagers into a lobby round run by another `baccarat lobby`
//! process sharing the same database.

use crate::commands::open_ledger;
use crate::error::CliError;
use baccarat_engine::payout::WagerSet;
use baccarat_table::config::TableConfig;
use baccarat_table::lobby::Lobby;
use std::io::Write;

pub fn handle_bet_command(
    user: i64,
    round: Option<String>,
    wagers: WagerSet,
    cfg: &TableConfig,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let lobby = Lobby::new(open_ledger(cfg)?, cfg.payouts);
    let round_id = match round {
        Some(id) => id,
        None => lobby
            .current_round()?
            .map(|r| r.round_id)
            .ok_or_else(|| CliError::InvalidInput("no lobby round is taking bets".into()))?,
    };
    for bet in lobby.place_bet(user, &round_id, &wagers)? {
        writeln!(
            out,
            "bet {} {} {} on {}",
            bet.id,
            bet.kind.label(),
            bet.amount,
            bet.round_id
        )?;
    }
    writeln!(out, "Balance: {}", lobby.balance(user)?)?;
    Ok(())
}
