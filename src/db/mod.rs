//! Database abstraction layer for sqlprompt.
//!
//! Provides a trait-based interface over one open session, allowing
//! different database backends to be used interchangeably by the prompt.

mod cursor;
mod mock;
mod mysql;
mod postgres;
mod sqlite;
mod types;

pub use mock::{MockFailure, MockSession};
pub use mysql::MySqlSession;
pub use postgres::PostgresSession;
pub use sqlite::SqliteSession;
pub use types::{is_textual_type, ColumnDescriptor, Row};

use crate::config::ConnectionConfig;
use crate::error::{PromptError, Result};
use async_trait::async_trait;
use sqlx::TypeInfo as _;
use std::fmt;

/// Update count reported when a statement has no meaningful row count.
pub const NO_UPDATE_COUNT: i64 = -1;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    MySql,
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a string for display and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a string (also accepts URL schemes).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Self::MySql),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Returns the default port for this backend (unused for SQLite).
    pub fn default_port(&self) -> u16 {
        match self {
            Self::MySql => 3306,
            Self::Postgres => 5432,
            Self::Sqlite => 0,
        }
    }

    /// Returns true if connecting requires a server and credentials.
    pub fn is_networked(&self) -> bool {
        !matches!(self, Self::Sqlite)
    }
}

/// The result of executing one statement.
pub enum Outcome<'a> {
    /// The statement produced rows; the cursor is positioned before the first.
    Rows(Box<dyn RowCursor + 'a>),
    /// The statement reported an update count (negative: not applicable).
    Update(i64),
}

impl fmt::Debug for Outcome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows(cursor) => f
                .debug_struct("Rows")
                .field("columns", &cursor.columns())
                .finish_non_exhaustive(),
            Self::Update(count) => f.debug_tuple("Update").field(count).finish(),
        }
    }
}

/// A forward-only cursor over a pending result set.
#[async_trait]
pub trait RowCursor: Send {
    /// Column descriptors of the result.
    fn columns(&self) -> &[ColumnDescriptor];

    /// Advances the cursor, returning the next row or `None` once exhausted.
    ///
    /// Calling again after exhaustion keeps returning `None`.
    async fn next_row(&mut self) -> Result<Option<Row>>;
}

/// One open, ready-to-query database session.
///
/// Failures are reported as `PromptError`; statement-level errors are
/// recoverable, transport failures are fatal.
#[async_trait]
pub trait Session: Send {
    /// Checks that the session can accept statements.
    async fn ping(&mut self) -> Result<()>;

    /// Executes one statement.
    async fn execute<'a>(&'a mut self, sql: &'a str) -> Result<Outcome<'a>>;

    /// Closes the session gracefully.
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Returns the update count to report for a statement.
///
/// Drivers always return a number; it is only meaningful for
/// data-modifying statements.
pub fn update_count(sql: &str, rows_affected: u64) -> i64 {
    if reports_row_count(sql) {
        i64::try_from(rows_affected).unwrap_or(i64::MAX)
    } else {
        NO_UPDATE_COUNT
    }
}

fn reports_row_count(sql: &str) -> bool {
    let verb = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(' || c == ';')
        .next()
        .unwrap_or("")
        .to_ascii_uppercase();

    matches!(
        verb.as_str(),
        "INSERT" | "UPDATE" | "DELETE" | "REPLACE" | "MERGE" | "COPY" | "LOAD" | "WITH"
    )
}

/// Builds descriptors from a prepared statement's columns.
pub(crate) fn column_descriptors<C: sqlx::Column>(columns: &[C]) -> Vec<ColumnDescriptor> {
    columns
        .iter()
        .map(|col| ColumnDescriptor::new(col.name(), is_textual_type(col.type_info().name())))
        .collect()
}

/// Maps sqlx connection errors to user-friendly messages.
pub(crate) fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> PromptError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.effective_port();
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        PromptError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
        || error_str.contains("access denied")
    {
        PromptError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if (error_str.contains("does not exist") || error_str.contains("unknown database"))
        && error_str.contains("database")
    {
        PromptError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("unable to open database file") {
        PromptError::connection(format!("Cannot open database file '{database}'."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        PromptError::connection(
            "Server requires TLS. Add '?sslmode=require' to the connection string.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        PromptError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        PromptError::connection(error.to_string())
    }
}
