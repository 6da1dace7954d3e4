//! Error types for sqlprompt.
//!
//! Defines the main error enum used throughout the application, and the
//! two-tier severity model the session loop branches on.

use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

/// How a failure affects the running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Local to one statement; the session stays usable.
    Recoverable,
    /// The session (or the console) is unusable; the loop must stop.
    Fatal,
}

/// Main error type for sqlprompt operations.
#[derive(Error, Debug)]
pub enum PromptError {
    /// The server (or the driver) rejected a single statement.
    #[error("{kind}: {message}")]
    Statement { kind: String, message: String },

    /// Database connection errors (host unreachable, auth failed, dropped link, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration errors (invalid config file, bad connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure reading statements or writing results.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PromptError {
    /// Creates a statement error of the given kind.
    pub fn statement(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Statement {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    ///
    /// Statement errors report the server-side error kind.
    pub fn category(&self) -> &str {
        match self {
            Self::Statement { kind, .. } => kind,
            Self::Connection(_) => "Connection Error",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "I/O Error",
        }
    }

    /// Classifies the error as recoverable or fatal.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Statement { .. } => Severity::Recoverable,
            Self::Connection(_) | Self::Config(_) | Self::Io(_) => Severity::Fatal,
        }
    }
}

impl From<sqlx::Error> for PromptError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(db_error) => {
                Self::statement(server_error_kind(db_error.as_ref()), db_error.message())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::connection(error.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::statement("DecodeError", error.to_string())
            }
            other => Self::statement("ClientError", other.to_string()),
        }
    }
}

/// Names the kind of a server-reported error.
fn server_error_kind(error: &dyn DatabaseError) -> &'static str {
    match error.kind() {
        ErrorKind::UniqueViolation => return "UniqueViolation",
        ErrorKind::ForeignKeyViolation => return "ForeignKeyViolation",
        ErrorKind::NotNullViolation => return "NotNullViolation",
        ErrorKind::CheckViolation => return "CheckViolation",
        _ => {}
    }

    match error.code() {
        Some(code) => error_code_kind(&code),
        None => "DatabaseError",
    }
}

/// Maps a SQLSTATE (Postgres, MySQL) or numeric result code (SQLite) to a kind.
pub(crate) fn error_code_kind(code: &str) -> &'static str {
    // SQLite codes are at most four digits; SQLSTATEs are exactly five characters.
    if let Some(sqlite_code) = code.parse::<u32>().ok().filter(|_| code.len() < 5) {
        // Extended SQLite codes carry the primary code in the low byte.
        return match sqlite_code & 0xff {
            1 => "SqlError",
            5 => "DatabaseBusy",
            8 => "ReadOnlyDatabase",
            19 => "ConstraintViolation",
            20 => "DatatypeMismatch",
            _ => "DatabaseError",
        };
    }

    if code.len() != 5 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return "DatabaseError";
    }

    match &code[..2] {
        "42" => "SyntaxError",
        "22" => "DataError",
        "23" => "IntegrityConstraintViolation",
        "40" => "TransactionRollback",
        "28" => "InvalidAuthorization",
        "0A" => "FeatureNotSupported",
        "3D" => "InvalidCatalogName",
        "3F" => "InvalidSchemaName",
        "25" => "InvalidTransactionState",
        "08" => "ConnectionException",
        "53" => "InsufficientResources",
        "57" => "OperatorIntervention",
        "HY" => "GeneralError",
        _ => "DatabaseError",
    }
}

/// Result type alias using PromptError.
pub type Result<T> = std::result::Result<T, PromptError>;
