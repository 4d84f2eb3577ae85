//! Errors raised by the table.
//!
//! Every error carries an [`ErrorSeverity`] that decides how loudly it is
//! logged: rejected wagers are routine, storage failures need investigation,
//! and engine invariant violations mean the round logic itself is broken.

use baccarat_engine::errors::EngineError;
use baccarat_engine::payout::WagerError;
use thiserror::Error;

use crate::lobby::LobbyState;

/// Error classification for logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Rejected requests - expected, normal operation
    Client,
    /// Storage failures - unexpected, needs investigation
    Server,
    /// Engine invariant violated - round logic is broken
    Critical,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("invalid wager: {0}")]
    Validation(#[from] WagerError),
    #[error("insufficient balance: {needed} needed, {available} available")]
    InsufficientBalance { needed: u64, available: u64 },
    #[error("unknown user {0}")]
    UnknownUser(i64),
    #[error("{0}")]
    InvalidInput(String),
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("round {0} not found")]
    RoundNotFound(String),
    #[error("betting is closed for round {round_id} (state: {state})")]
    BettingClosed { round_id: String, state: LobbyState },
    #[error("round {round_id} cannot move from {from} to {to}")]
    InvalidLobbyTransition {
        round_id: String,
        from: LobbyState,
        to: LobbyState,
    },
    #[error("amount {0} is outside the storable range")]
    AmountOutOfRange(u64),
    #[error("stored record is corrupt: {0}")]
    CorruptRecord(String),
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("ledger storage lock poisoned")]
    StoragePoisoned,
    #[error("persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),
    #[error("engine invariant violated: {0}")]
    Engine(#[from] EngineError),
}

impl TableError {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            TableError::Validation(_) => "invalid_wager",
            TableError::InsufficientBalance { .. } => "insufficient_balance",
            TableError::UnknownUser(_) => "unknown_user",
            TableError::InvalidInput(_) => "invalid_input",
            TableError::UsernameTaken(_) => "username_taken",
            TableError::RoundNotFound(_) => "round_not_found",
            TableError::BettingClosed { .. } => "betting_closed",
            TableError::InvalidLobbyTransition { .. } => "invalid_lobby_transition",
            TableError::AmountOutOfRange(_) => "amount_out_of_range",
            TableError::CorruptRecord(_) => "corrupt_record",
            TableError::Io(_) => "io_failure",
            TableError::StoragePoisoned => "storage_poisoned",
            TableError::Persistence(_) => "persistence_failure",
            TableError::Engine(_) => "engine_invariant_violation",
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TableError::Validation(_)
            | TableError::InsufficientBalance { .. }
            | TableError::UnknownUser(_)
            | TableError::InvalidInput(_)
            | TableError::UsernameTaken(_)
            | TableError::RoundNotFound(_)
            | TableError::BettingClosed { .. }
            | TableError::InvalidLobbyTransition { .. }
            | TableError::AmountOutOfRange(_) => ErrorSeverity::Client,
            TableError::CorruptRecord(_)
            | TableError::Io(_)
            | TableError::StoragePoisoned
            | TableError::Persistence(_) => ErrorSeverity::Server,
            TableError::Engine(_) => ErrorSeverity::Critical,
        }
    }

    /// Emits the error at the tracing level its severity calls for.
    pub fn log(&self, operation: &'static str) {
        match self.severity() {
            ErrorSeverity::Client => tracing::info!(
                operation,
                error_code = self.error_code(),
                error = %self,
                "request rejected"
            ),
            ErrorSeverity::Server => tracing::error!(
                operation,
                error_code = self.error_code(),
                error = %self,
                "storage failure, changes rolled back"
            ),
            ErrorSeverity::Critical => tracing::error!(
                operation,
                error_code = self.error_code(),
                error = %self,
                critical = true,
                "engine invariant violated, changes rolled back"
            ),
        }
    }
}
