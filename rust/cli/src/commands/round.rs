//! `round --id`: a stored round with every bet placed on it, as JSON.

use crate::commands::open_ledger;
use crate::error::CliError;
use baccarat_table::config::TableConfig;
use std::io::Write;

pub fn handle_round_command(
    round_id: &str,
    cfg: &TableConfig,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let details = open_ledger(cfg)?.round_details(round_id)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&details)?)?;
    Ok(())
}
