//! Command handler modules for the baccarat CLI.
//!
//! Each command lives in its own module and exposes one
//! `handle_COMMAND_command(...) -> Result<(), CliError>` function. Output
//! streams are passed in so handlers can be tested against buffers.

mod bet;
mod cfg;
mod deal;
mod lobby;
mod play;
mod round;
mod user;
mod verify;

pub use bet::handle_bet_command;
pub use cfg::handle_cfg_command;
pub use deal::handle_deal_command;
pub use lobby::handle_lobby_command;
pub use play::handle_play_command;
pub use round::handle_round_command;
pub use user::handle_user_command;
pub use verify::handle_verify_command;

use std::sync::Arc;

use baccarat_table::config::{self, ConfigResolved, TableConfig};
use baccarat_table::ledger::Ledger;

use crate::error::CliError;

/// Resolves the configuration; `path` takes the place of `BACCARAT_CONFIG`.
pub fn load_config(path: Option<&str>) -> Result<ConfigResolved, CliError> {
    let resolved = match path {
        None => config::load_with_sources()?,
        Some(path) => config::load_from(|key| match key {
            "BACCARAT_CONFIG" => Some(path.to_string()),
            _ => std::env::var(key).ok(),
        })?,
    };
    Ok(resolved)
}

pub(crate) fn open_ledger(cfg: &TableConfig) -> Result<Arc<Ledger>, CliError> {
    Ok(Arc::new(Ledger::open(&cfg.database)?))
}
