//! `play`: private rounds settled against the ledger.

use crate::commands::open_ledger;
use crate::error::CliError;
use crate::ui;
use baccarat_engine::payout::WagerSet;
use baccarat_table::config::TableConfig;
use baccarat_table::settlement::Table;
use std::io::Write;

/// Plays `times` rounds for `user` and prints one line per round followed by
/// the closing balance.
pub fn handle_play_command(
    user: i64,
    wagers: WagerSet,
    times: u32,
    cfg: &TableConfig,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let table = Table::new(open_ledger(cfg)?);
    let results = table.play_rounds(user, &wagers, &cfg.payouts, times)?;
    for r in &results {
        let line = ui::round_line(
            &r.round_id,
            r.winner.label(),
            r.player_score,
            r.banker_score,
            r.lucky_six.label(),
            r.total_wagered,
            r.total_payout,
        );
        writeln!(out, "{}", line)?;
    }
    writeln!(out, "Balance: {}", table.ledger().balance(user)?)?;
    Ok(())
}
