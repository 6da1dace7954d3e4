//! PostgreSQL session implementation.
//!
//! Provides the `PostgresSession` struct that implements the `Session` trait
//! for PostgreSQL databases using sqlx.

use super::cursor::StreamCursor;
use super::{column_descriptors, map_connection_error, update_count, Outcome, Session};
use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Connection, Executor, Row as _, Statement};
use tracing::debug;

/// PostgreSQL session over a single connection.
#[derive(Debug)]
pub struct PostgresSession {
    conn: PgConnection,
}

impl PostgresSession {
    /// Opens a connection using the given configuration.
    ///
    /// Unset fields fall back to libpq-style defaults (`PGHOST`, `PGUSER`, ...).
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        // Statements are described afresh every time so DDL is seen immediately.
        let mut options = PgConnectOptions::new()
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

        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Connected to {}", config.display_string());
        Ok(Self { conn })
    }
}

#[async_trait]
impl Session for PostgresSession {
    async fn ping(&mut self) -> Result<()> {
        self.conn.ping().await?;
        Ok(())
    }

    async fn execute<'a>(&'a mut self, sql: &'a str) -> Result<Outcome<'a>> {
        // Describe through the extended protocol, then run through the simple
        // protocol so that every value arrives in text format.
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

fn read_cell(row: &PgRow, index: usize) -> std::result::Result<Option<String>, sqlx::Error> {
    row.try_get_unchecked::<Option<String>, _>(index)
}
