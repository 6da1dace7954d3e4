//! SQLite session implementation.

use super::cursor::StreamCursor;
use super::{column_descriptors, map_connection_error, update_count, Outcome, Session};
use crate::config::ConnectionConfig;
use crate::error::{PromptError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Connection, Executor, Row as _, Statement};
use tracing::debug;

/// SQLite session over a single database file (or an in-memory database).
#[derive(Debug)]
pub struct SqliteSession {
    conn: SqliteConnection,
}

impl SqliteSession {
    /// Opens the database named by `config.database`.
    ///
    /// The file must already exist; `:memory:` opens a private in-memory database.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let path = config
            .database
            .as_deref()
            .ok_or_else(|| PromptError::config("SQLite requires a database file path"))?;

        let options = if path == ":memory:" {
            "sqlite::memory:"
                .parse::<SqliteConnectOptions>()
                .map_err(|e| map_connection_error(e, config))?
        } else {
            SqliteConnectOptions::new().filename(path)
        };
        // Cached statements keep the column list they were described with,
        // which goes stale after the schema changes.
        let options = options.statement_cache_capacity(0);

        let conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Opened {}", config.display_string());
        Ok(Self { conn })
    }
}

#[async_trait]
impl Session for SqliteSession {
    async fn ping(&mut self) -> Result<()> {
        self.conn.ping().await?;
        Ok(())
    }

    async fn execute<'a>(&'a mut self, sql: &'a str) -> Result<Outcome<'a>> {
        let statement = (&mut self.conn).prepare(sql).await?;
        let columns = column_descriptors(statement.columns());

        if columns.is_empty() {
            let done = (&mut self.conn).execute(sqlx::raw_sql(sql)).await?;
            return Ok(Outcome::Update(update_count(sql, done.rows_affected())));
        }

        let rows = sqlx::raw_sql(sql).fetch(&mut self.conn);
        Ok(Outcome::Rows(Box::new(StreamCursor::new(
            columns, rows, read_cell,
        ))))
    }

    async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

// Reading as a blob makes SQLite render integers and reals as text.
fn read_cell(row: &SqliteRow, index: usize) -> std::result::Result<Option<String>, sqlx::Error> {
    let bytes = row.try_get_unchecked::<Option<Vec<u8>>, _>(index)?;
    Ok(bytes.map(|b| String::from_utf8_lossy(&b).into_owned()))
}
