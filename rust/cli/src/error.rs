//! Error types for the CLI application.

use std::fmt;

use baccarat_engine::errors::EngineError;
use baccarat_table::config::ConfigError;
use baccarat_table::errors::TableError;

/// Custom error type for CLI operations.
#[derive(Debug)]
pub enum CliError {
    /// I/O error (file operations, stdout/stderr writes, etc.)
    Io(std::io::Error),

    /// Invalid user input or command-line arguments
    InvalidInput(String),

    /// Configuration error
    Config(String),

    /// Rejected or failed ledger operation
    Table(TableError),

    /// Engine-related error
    Engine(String),

    /// Stored rounds that do not match their re-derivation
    Audit(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Table(e) => write!(f, "{}", e),
            CliError::Engine(msg) => write!(f, "Engine error: {}", msg),
            CliError::Audit(msg) => write!(f, "Audit failed: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            CliError::Table(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        CliError::Io(error)
    }
}

impl From<TableError> for CliError {
    fn from(error: TableError) -> Self {
        CliError::Table(error)
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        CliError::Config(error.to_string())
    }
}

impl From<EngineError> for CliError {
    fn from(error: EngineError) -> Self {
        CliError::Engine(error.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        CliError::Io(std::io::Error::other(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_errors_keep_their_message() {
        let e: CliError = TableError::UnknownUser(7).into();
        assert_eq!(e.to_string(), "unknown user 7");
    }

    #[test]
    fn config_errors_are_prefixed() {
        let e: CliError = ConfigError::Invalid("database path must not be empty".into()).into();
        assert_eq!(
            e.to_string(),
            "Configuration error: database path must not be empty"
        );
    }
}
