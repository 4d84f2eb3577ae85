//! `verify`: replays every stored round and checks what was paid.

use crate::commands::open_ledger;
use crate::error::CliError;
use baccarat_table::audit::audit_rounds;
use baccarat_table::config::TableConfig;
use std::io::Write;

/// Prints the audit report as JSON. Any discrepancy makes the command fail.
pub fn handle_verify_command(cfg: &TableConfig, out: &mut dyn Write) -> Result<(), CliError> {
    let ledger = open_ledger(cfg)?;
    let report = audit_rounds(&ledger, &cfg.payouts)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    if report.is_clean() {
        Ok(())
    } else {
        Err(CliError::Audit(format!(
            "{} discrepancies in {} rounds",
            report.discrepancies.len(),
            report.rounds_checked
        )))
    }
}
