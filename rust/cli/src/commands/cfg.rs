//! Configuration command handler.
//!
//! Prints every resolved setting with the source it came from:
//!
//! ```json
//! {
//!   "database": {
//!     "value": "baccarat.db",
//!     "source": "default"
//!   },
//!   ...
//! }
//! ```

use crate::error::CliError;
use baccarat_table::config::ConfigResolved;
use std::io::Write;

pub fn handle_cfg_command(resolved: &ConfigResolved, out: &mut dyn Write) -> Result<(), CliError> {
    let ConfigResolved { config, sources } = resolved;
    let p = &config.payouts;
    let display = serde_json::json!({
        "database": { "value": config.database, "source": sources.database },
        "player_odds": { "value": p.player_odds, "source": sources.player_odds },
        "banker_odds": { "value": p.banker_odds, "source": sources.banker_odds },
        "tie_odds": { "value": p.tie_odds, "source": sources.tie_odds },
        "lucky6_two_card_odds": {
            "value": p.lucky6_two_card_odds,
            "source": sources.lucky6_two_card_odds,
        },
        "lucky6_three_card_odds": {
            "value": p.lucky6_three_card_odds,
            "source": sources.lucky6_three_card_odds,
        },
        "banker_lucky6_two_card_odds": {
            "value": p.banker_lucky6_two_card_odds,
            "source": sources.banker_lucky6_two_card_odds,
        },
        "banker_lucky6_three_card_odds": {
            "value": p.banker_lucky6_three_card_odds,
            "source": sources.banker_lucky6_three_card_odds,
        },
        "lobby_enabled": { "value": config.lobby.enabled, "source": sources.lobby_enabled },
        "lobby_interval_secs": {
            "value": config.lobby.interval_secs,
            "source": sources.lobby_interval_secs,
        },
        "lobby_betting_window_secs": {
            "value": config.lobby.betting_window_secs,
            "source": sources.lobby_betting_window_secs,
        },
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&display)?)?;
    Ok(())
}
