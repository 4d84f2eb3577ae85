//! Account management: `user create`, `user deposit`, `user balance`.

use crate::cli::UserAction;
use crate::commands::open_ledger;
use crate::error::CliError;
use baccarat_table::config::TableConfig;
use std::io::Write;

pub fn handle_user_command(
    action: UserAction,
    cfg: &TableConfig,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let ledger = open_ledger(cfg)?;
    match action {
        UserAction::Create { name, balance } => {
            let user = ledger.create_user(&name, balance)?;
            writeln!(out, "{}", serde_json::to_string(&user)?)?;
        }
        UserAction::Deposit { id, amount } => {
            let balance = ledger.deposit(id, amount)?;
            writeln!(out, "Balance: {}", balance)?;
        }
        UserAction::Balance { id } => {
            writeln!(out, "Balance: {}", ledger.balance(id)?)?;
        }
    }
    Ok(())
}
