//! MySQL session implementation.

use super::cursor::{peek_rows, ResultStart, StreamCursor};
use super::{
    column_descriptors, map_connection_error, update_count, ColumnDescriptor, Outcome, Session,
};
use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlDatabaseError, MySqlRow};
use sqlx::{Connection, Executor, Row as _, Statement};
use tracing::debug;

/// Server error raised when a statement cannot go through the prepared protocol.
const ER_UNSUPPORTED_PS: u16 = 1295;

/// MySQL (and MariaDB) session over a single connection.
#[derive(Debug)]
pub struct MySqlSession {
    conn: MySqlConnection,
}

impl MySqlSession {
    /// Opens a connection using the given configuration.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        // Statements are described afresh every time so DDL is seen immediately.
        let mut options = MySqlConnectOptions::new()
            .port(config.effective_port())
            .statement_cache_capacity(0);
        if let Some(host) = &config.host {
            options = options.host(host);
        }
        if let Some(user) = &config.user {
            options = options.username(user);
        }
        if let Some(password) = &config.password {
            options = options.password(password);
        }
        if let Some(database) = &config.database {
            options = options.database(database);
        }

        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Connected to {}", config.display_string());
        Ok(Self { conn })
    }

    /// Runs a statement the server would not describe; `HELP` and some
    /// administrative statements still return rows this way.
    async fn execute_undescribed<'a>(&'a mut self, sql: &'a str) -> Result<Outcome<'a>> {
        let results = sqlx::raw_sql(sql)
            .fetch_many(&mut self.conn)
            .map_ok(|step| step.map_left(|done| done.rows_affected()))
            .boxed();

        match peek_rows(results, describe_row).await? {
            ResultStart::Rows { columns, rows } => Ok(Outcome::Rows(Box::new(
                StreamCursor::new(columns, rows, read_cell),
            ))),
            ResultStart::Done(rows_affected) => {
                Ok(Outcome::Update(update_count(sql, rows_affected)))
            }
        }
    }
}

#[async_trait]
impl Session for MySqlSession {
    async fn ping(&mut self) -> Result<()> {
        self.conn.ping().await?;
        Ok(())
    }

    async fn execute<'a>(&'a mut self, sql: &'a str) -> Result<Outcome<'a>> {
        let columns = match (&mut self.conn).prepare(sql).await {
            Ok(statement) => column_descriptors(statement.columns()),
            Err(e) if is_unsupported_prepare(&e) => {
                debug!("Statement not preparable, running as text: {sql}");
                return self.execute_undescribed(sql).await;
            }
            Err(e) => return Err(e.into()),
        };

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

fn is_unsupported_prepare(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => e
            .try_downcast_ref::<MySqlDatabaseError>()
            .is_some_and(|e| e.number() == ER_UNSUPPORTED_PS),
        _ => false,
    }
}

fn describe_row(row: &MySqlRow) -> Vec<ColumnDescriptor> {
    column_descriptors(row.columns())
}

// Text protocol cells may not be valid UTF-8 (binary collations).
fn read_cell(row: &MySqlRow, index: usize) -> std::result::Result<Option<String>, sqlx::Error> {
    let bytes = row.try_get_unchecked::<Option<Vec<u8>>, _>(index)?;
    Ok(bytes.map(|b| String::from_utf8_lossy(&b).into_owned()))
}
