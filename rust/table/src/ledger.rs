//! SQLite-backed balance ledger.
//!
//! Balances only change inside [`Ledger::write`], which runs its closure in an
//! `IMMEDIATE` transaction: the write lock is taken up front, so a debit can
//! never race a concurrent one into a lost update. Every balance change also
//! appends one row to the `transactions` journal in the same transaction.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::errors::TableError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    balance INTEGER NOT NULL CHECK (balance >= 0),
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS rounds (
    round_id TEXT PRIMARY KEY,
    mode TEXT NOT NULL CHECK (mode IN ('private', 'lobby')),
    seed INTEGER,
    player_initial_cards TEXT NOT NULL,
    banker_initial_cards TEXT NOT NULL,
    player_initial_score INTEGER NOT NULL,
    banker_initial_score INTEGER NOT NULL,
    player_third_card TEXT,
    banker_third_card TEXT,
    player_final_score INTEGER NOT NULL,
    banker_final_score INTEGER NOT NULL,
    winner TEXT NOT NULL,
    is_lucky_six INTEGER NOT NULL,
    lucky_six_type TEXT,
    player_payout INTEGER,
    banker_payout INTEGER,
    tie_payout INTEGER,
    lucky_six_payout INTEGER,
    total_wagered INTEGER NOT NULL,
    total_paid INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS bets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    round_id TEXT NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id),
    bet_type TEXT NOT NULL CHECK (bet_type IN ('player', 'banker', 'tie', 'luckySix')),
    amount INTEGER NOT NULL CHECK (amount > 0),
    payout INTEGER,
    principal_return INTEGER,
    status TEXT NOT NULL CHECK (status IN ('pending', 'settled')),
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_bets_round ON bets(round_id);
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    amount INTEGER NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('deposit', 'wager', 'payout')),
    round_id TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transactions_round ON transactions(round_id);
CREATE TABLE IF NOT EXISTS lobby_rounds (
    round_id TEXT PRIMARY KEY,
    state TEXT NOT NULL,
    betting_opens_at TEXT,
    betting_closes_at TEXT,
    created_at TEXT NOT NULL
);
";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub balance: u64,
    pub created_at: String,
}

/// Kind of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Deposit,
    Wager,
    Payout,
}

impl EntryKind {
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::Deposit => "deposit",
            EntryKind::Wager => "wager",
            EntryKind::Payout => "payout",
        }
    }
}

#[derive(Debug)]
pub struct Ledger {
    conn: Mutex<Connection>,
}

impl Ledger {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, TableError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, TableError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TableError> {
        self.conn.lock().map_err(|_| TableError::StoragePoisoned)
    }

    /// Runs `f` as one unit of work. The transaction commits only when `f`
    /// returns `Ok`; any error rolls back every change `f` made.
    pub fn write<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, TableError>,
    ) -> Result<T, TableError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Read-only access outside any write transaction.
    pub fn read<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, TableError>,
    ) -> Result<T, TableError> {
        let conn = self.lock()?;
        f(&conn)
    }

    pub fn create_user(&self, username: &str, opening_balance: u64) -> Result<User, TableError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(TableError::InvalidInput("username must not be empty".into()));
        }
        let user = self.write(|tx| {
            let taken: Option<i64> = tx
                .query_row(
                    "SELECT id FROM users WHERE username = ?1",
                    params![username],
                    |row| row.get(0),
                )
                .optional()?;
            if taken.is_some() {
                return Err(TableError::UsernameTaken(username.to_string()));
            }
            let created_at = now();
            tx.execute(
                "INSERT INTO users (username, balance, created_at) VALUES (?1, 0, ?2)",
                params![username, created_at],
            )?;
            let id = tx.last_insert_rowid();
            if opening_balance > 0 {
                credit(tx, id, opening_balance, EntryKind::Deposit, None)?;
            }
            Ok(User {
                id,
                username: username.to_string(),
                balance: opening_balance,
                created_at,
            })
        })?;
        tracing::info!(
            user_id = user.id,
            username = %user.username,
            balance = user.balance,
            "user created"
        );
        Ok(user)
    }

    /// Adds `amount` to the balance and returns the new balance.
    pub fn deposit(&self, user_id: i64, amount: u64) -> Result<u64, TableError> {
        if amount == 0 {
            return Err(TableError::InvalidInput("deposit must be positive".into()));
        }
        let balance = self.write(|tx| {
            credit(tx, user_id, amount, EntryKind::Deposit, None)?;
            balance_of(tx, user_id)
        })?;
        tracing::info!(user_id, amount, balance, "deposit recorded");
        Ok(balance)
    }

    pub fn balance(&self, user_id: i64) -> Result<u64, TableError> {
        self.read(|conn| balance_of(conn, user_id))
    }

    pub fn user(&self, user_id: i64) -> Result<User, TableError> {
        self.read(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, balance, created_at FROM users WHERE id = ?1",
                    params![user_id],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;
            let (id, username, balance, created_at) =
                row.ok_or(TableError::UnknownUser(user_id))?;
            Ok(User {
                id,
                username,
                balance: from_sql(balance, "users.balance")?,
                created_at,
            })
        })
    }

    /// Sum of all journal entries tagged with `round_id`.
    pub fn journal_total(&self, round_id: &str) -> Result<i64, TableError> {
        self.read(|conn| journal_total(conn, round_id))
    }
}

pub(crate) fn journal_total(conn: &Connection, round_id: &str) -> Result<i64, TableError> {
    Ok(conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE round_id = ?1",
        params![round_id],
        |row| row.get(0),
    )?)
}

pub(crate) fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Amounts are stored as SQLite INTEGER.
pub(crate) fn to_sql(amount: u64) -> Result<i64, TableError> {
    i64::try_from(amount).map_err(|_| TableError::AmountOutOfRange(amount))
}

pub(crate) fn from_sql(value: i64, column: &str) -> Result<u64, TableError> {
    u64::try_from(value)
        .map_err(|_| TableError::CorruptRecord(format!("negative amount {value} in {column}")))
}

pub(crate) fn balance_of(conn: &Connection, user_id: i64) -> Result<u64, TableError> {
    let balance: Option<i64> = conn
        .query_row(
            "SELECT balance FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    let balance = balance.ok_or(TableError::UnknownUser(user_id))?;
    from_sql(balance, "users.balance")
}

fn journal(
    conn: &Connection,
    user_id: i64,
    amount: i64,
    kind: EntryKind,
    round_id: Option<&str>,
) -> Result<(), TableError> {
    conn.execute(
        "INSERT INTO transactions (user_id, amount, kind, round_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, amount, kind.label(), round_id, now()],
    )?;
    Ok(())
}

/// Conditional debit: the balance check and the decrement are one statement.
pub(crate) fn debit(
    conn: &Connection,
    user_id: i64,
    amount: u64,
    round_id: Option<&str>,
) -> Result<(), TableError> {
    let value = to_sql(amount)?;
    let changed = conn.execute(
        "UPDATE users SET balance = balance - ?1 WHERE id = ?2 AND balance >= ?1",
        params![value, user_id],
    )?;
    if changed == 0 {
        let available = balance_of(conn, user_id)?;
        return Err(TableError::InsufficientBalance {
            needed: amount,
            available,
        });
    }
    journal(conn, user_id, -value, EntryKind::Wager, round_id)
}

pub(crate) fn credit(
    conn: &Connection,
    user_id: i64,
    amount: u64,
    kind: EntryKind,
    round_id: Option<&str>,
) -> Result<(), TableError> {
    let value = to_sql(amount)?;
    let changed = conn.execute(
        "UPDATE users SET balance = balance + ?1 WHERE id = ?2 AND balance <= ?3",
        params![value, user_id, i64::MAX - value],
    )?;
    if changed == 0 {
        // Either the user is missing or the balance would overflow.
        balance_of(conn, user_id)?;
        return Err(TableError::AmountOutOfRange(amount));
    }
    journal(conn, user_id, value, kind, round_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> Ledger {
        Ledger::open_in_memory().expect("in-memory ledger")
    }

    #[test]
    fn create_user_journals_opening_balance() {
        let ledger = ledger();
        let user = ledger.create_user("alice", 500).unwrap();
        assert_eq!(ledger.balance(user.id).unwrap(), 500);
        let entries: i64 = ledger
            .read(|c| {
                Ok(c.query_row(
                    "SELECT COUNT(*) FROM transactions WHERE user_id = ?1 AND kind = 'deposit'",
                    params![user.id],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(entries, 1);
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let ledger = ledger();
        ledger.create_user("bob", 0).unwrap();
        assert!(matches!(
            ledger.create_user("bob", 10),
            Err(TableError::UsernameTaken(name)) if name == "bob"
        ));
    }

    #[test]
    fn deposit_returns_new_balance() {
        let ledger = ledger();
        let user = ledger.create_user("carol", 100).unwrap();
        assert_eq!(ledger.deposit(user.id, 50).unwrap(), 150);
        assert!(matches!(
            ledger.deposit(999, 50),
            Err(TableError::UnknownUser(999))
        ));
    }

    #[test]
    fn debit_refuses_to_overdraw() {
        let ledger = ledger();
        let user = ledger.create_user("dave", 30).unwrap();
        let err = ledger
            .write(|tx| debit(tx, user.id, 40, None))
            .unwrap_err();
        assert!(matches!(
            err,
            TableError::InsufficientBalance {
                needed: 40,
                available: 30
            }
        ));
        assert_eq!(ledger.balance(user.id).unwrap(), 30);
    }

    #[test]
    fn failed_unit_of_work_rolls_back() {
        let ledger = ledger();
        let user = ledger.create_user("erin", 100).unwrap();
        let result: Result<(), TableError> = ledger.write(|tx| {
            debit(tx, user.id, 60, Some("r1"))?;
            Err(TableError::StoragePoisoned)
        });
        assert!(result.is_err());
        assert_eq!(ledger.balance(user.id).unwrap(), 100);
        assert_eq!(ledger.journal_total("r1").unwrap(), 0);
    }

    #[test]
    fn credit_guards_against_overflow() {
        let ledger = ledger();
        let user = ledger.create_user("frank", i64::MAX as u64).unwrap();
        assert!(matches!(
            ledger.deposit(user.id, 1),
            Err(TableError::AmountOutOfRange(1))
        ));
        assert!(matches!(
            ledger.deposit(user.id, u64::MAX),
            Err(TableError::AmountOutOfRange(_))
        ));
    }

    #[test]
    fn ledger_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/table.db");
        let id = {
            let ledger = Ledger::open(&path).unwrap();
            ledger.create_user("gina", 70).unwrap().id
        };
        let reopened = Ledger::open(&path).unwrap();
        assert_eq!(reopened.user(id).unwrap().username, "gina");
        assert_eq!(reopened.balance(id).unwrap(), 70);
    }
}
