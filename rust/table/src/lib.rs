//! # baccarat-table: Settlement and Lobby
//!
//! Runs baccarat rounds against a SQLite-backed balance ledger. Every round is
//! settled inside one immediate transaction: the wager is debited, the round
//! is dealt, payouts are credited and the round and its bets are recorded, or
//! nothing happens at all.
//!
//! - [`ledger`] - accounts, balances and the journal of every balance change
//! - [`settlement`] - private rounds (`PlayRound`)
//! - [`records`] - round and bet records (`GetRoundDetails`)
//! - [`lobby`] - shared betting windows and the auto-round scheduler
//! - [`audit`] - offline re-derivation of stored rounds
//! - [`shoes`] - where each round's shoe comes from
//! - [`config`] - TOML and environment configuration
//! - [`logging`] - tracing subscriber setup
//! - [`errors`] - error type and its severity
//!
//! ```rust
//! use std::sync::Arc;
//! use baccarat_engine::payout::{PayoutTable, WagerSet};
//! use baccarat_table::ledger::Ledger;
//! use baccarat_table::settlement::Table;
//!
//! let ledger = Arc::new(Ledger::open_in_memory().unwrap());
//! let user = ledger.create_user("alice", 1_000).unwrap();
//! let table = Table::new(Arc::clone(&ledger));
//! let wagers = WagerSet { player: 100, ..Default::default() };
//! let result = table.play_round(user.id, &wagers, &PayoutTable::default()).unwrap();
//! assert_eq!(ledger.balance(user.id).unwrap(), 1_000 - 100 + result.total_payout);
//! ```

pub mod audit;
pub mod config;
pub mod errors;
pub mod ledger;
pub mod lobby;
pub mod logging;
pub mod records;
pub mod settlement;
pub mod shoes;
