//! # Baccarat CLI Library
//!
//! Command-line front end for the baccarat table: accounts, private rounds,
//! the shared lobby and the payout audit.
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::io;
//! let args = vec!["baccarat", "play", "--user", "1", "--banker", "100"];
//! let code = baccarat_cli::run(args, &mut io::stdout(), &mut io::stderr());
//! assert_eq!(code, 0);
//! ```
//!
//! ## Available Subcommands
//!
//! - `cfg`: Display the resolved configuration and where each value came from
//! - `user`: Create accounts, deposit, show balances
//! - `play`: Settle private rounds for one user
//! - `bet`: Place bets on the lobby round currently taking bets
//! - `round`: Show a stored round with its bets
//! - `deal`: Deal one round for inspection
//! - `lobby`: Run the lobby scheduler
//! - `verify`: Audit every stored round

use clap::Parser;
use std::io::Write;

pub mod cli;
mod commands;
mod error;
pub mod exit_code;
pub mod ui;

use cli::{BaccaratCli, Commands};
use commands::{
    handle_bet_command, handle_cfg_command, handle_deal_command, handle_lobby_command,
    handle_play_command, handle_round_command, handle_user_command, handle_verify_command,
    load_config,
};

pub use error::CliError;

/// Main entry point for the CLI application.
///
/// Parses `args` and dispatches to the subcommand handler. Normal output goes
/// to `out`; every failure is reported on `err` as `Error: <message>`.
///
/// Returns [`exit_code::SUCCESS`] or [`exit_code::ERROR`].
///
/// ```
/// use std::io;
/// let args = vec!["baccarat", "deal", "--seed", "42"];
/// let code = baccarat_cli::run(args, &mut io::stdout(), &mut io::stderr());
/// assert_eq!(code, 0);
/// ```
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    const COMMANDS: &[&str] = &[
        "cfg", "user", "play", "bet", "round", "deal", "lobby", "verify",
    ];
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    match BaccaratCli::try_parse_from(&argv) {
        Err(e) => {
            use clap::error::ErrorKind;

            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    if write!(out, "{}", e).is_err() {
                        return exit_code::ERROR;
                    }
                    exit_code::SUCCESS
                }
                _ => {
                    if writeln!(err, "{}", e).is_err()
                        || writeln!(err, "Usage: baccarat <command> [options]\n").is_err()
                        || writeln!(err, "Commands:").is_err()
                    {
                        return exit_code::ERROR;
                    }
                    for c in COMMANDS {
                        if writeln!(err, "  {}", c).is_err() {
                            return exit_code::ERROR;
                        }
                    }
                    exit_code::ERROR
                }
            }
        }
        Ok(cli) => match dispatch(cli, out, err) {
            Ok(()) => exit_code::SUCCESS,
            Err(e) => {
                let _ = ui::write_error(err, &e.to_string());
                exit_code::ERROR
            }
        },
    }
}

fn dispatch(cli: BaccaratCli, out: &mut dyn Write, err: &mut dyn Write) -> Result<(), CliError> {
    let resolved = load_config(cli.config.as_deref())?;
    let cfg = &resolved.config;
    match cli.cmd {
        Commands::Cfg => handle_cfg_command(&resolved, out),
        Commands::User { action } => handle_user_command(action, cfg, out),
        Commands::Play {
            user,
            wagers,
            times,
        } => handle_play_command(user, wagers.to_wagers(), times, cfg, out),
        Commands::Bet {
            user,
            round,
            wagers,
        } => handle_bet_command(user, round, wagers.to_wagers(), cfg, out),
        Commands::Round { id } => handle_round_command(&id, cfg, out),
        Commands::Deal { seed, log } => handle_deal_command(seed, log.as_deref(), out),
        Commands::Lobby {
            rounds,
            interval_secs,
            window_secs,
        } => handle_lobby_command(rounds, interval_secs, window_secs, cfg, out, err),
        Commands::Verify => handle_verify_command(cfg, out),
    }
}
