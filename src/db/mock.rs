//! Mock database session for testing.
//!
//! Provides a scripted in-memory session for headless testing of the
//! prompt without a database server.

use super::{update_count, ColumnDescriptor, Outcome, Row, RowCursor, Session};
use crate::error::{PromptError, Result};
use async_trait::async_trait;
use std::collections::HashMap;

/// A failure the mock raises for a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// A statement-level error (the session stays usable).
    Statement { kind: String, message: String },
    /// A transport failure (the session is broken afterwards).
    Connection(String),
}

impl MockFailure {
    fn to_error(&self) -> PromptError {
        match self {
            Self::Statement { kind, message } => PromptError::statement(kind, message),
            Self::Connection(msg) => PromptError::connection(msg),
        }
    }
}

#[derive(Debug, Clone)]
enum MockResponse {
    Rows {
        columns: Vec<ColumnDescriptor>,
        rows: Vec<Row>,
        then_fail: Option<MockFailure>,
    },
    Update(i64),
    Fail(MockFailure),
}

/// A mock session that returns scripted results keyed by statement text.
#[derive(Debug, Default)]
pub struct MockSession {
    responses: HashMap<String, MockResponse>,
    executed: Vec<String>,
    broken: bool,
}

impl MockSession {
    /// Creates a new mock session with no scripted statements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session whose initial ping fails.
    pub fn disconnected() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    /// Scripts a row result for `sql`.
    pub fn with_rows(self, sql: &str, columns: Vec<ColumnDescriptor>, rows: Vec<Row>) -> Self {
        self.respond(
            sql,
            MockResponse::Rows {
                columns,
                rows,
                then_fail: None,
            },
        )
    }

    /// Scripts a row result for `sql` that fails after yielding `rows`.
    pub fn with_rows_then_failure(
        self,
        sql: &str,
        columns: Vec<ColumnDescriptor>,
        rows: Vec<Row>,
        failure: MockFailure,
    ) -> Self {
        self.respond(
            sql,
            MockResponse::Rows {
                columns,
                rows,
                then_fail: Some(failure),
            },
        )
    }

    /// Scripts an update count for `sql`.
    pub fn with_update(self, sql: &str, count: i64) -> Self {
        self.respond(sql, MockResponse::Update(count))
    }

    /// Scripts a statement error for `sql`.
    pub fn with_statement_error(self, sql: &str, kind: &str, message: &str) -> Self {
        self.respond(
            sql,
            MockResponse::Fail(MockFailure::Statement {
                kind: kind.to_string(),
                message: message.to_string(),
            }),
        )
    }

    /// Scripts a transport failure for `sql`.
    pub fn with_connection_error(self, sql: &str, message: &str) -> Self {
        self.respond(
            sql,
            MockResponse::Fail(MockFailure::Connection(message.to_string())),
        )
    }

    /// Statements executed so far, in order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    fn respond(mut self, sql: &str, response: MockResponse) -> Self {
        self.responses.insert(sql.to_string(), response);
        self
    }

    fn unscripted(sql: &str) -> MockResponse {
        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            MockResponse::Rows {
                columns: vec![ColumnDescriptor::textual("result")],
                rows: vec![vec![Some(format!("Mock result for: {sql}"))]],
                then_fail: None,
            }
        } else {
            MockResponse::Update(update_count(sql, 0))
        }
    }
}

#[async_trait]
impl Session for MockSession {
    async fn ping(&mut self) -> Result<()> {
        if self.broken {
            return Err(PromptError::connection("mock connection is closed"));
        }
        Ok(())
    }

    async fn execute<'a>(&'a mut self, sql: &'a str) -> Result<Outcome<'a>> {
        if self.broken {
            return Err(PromptError::connection("mock connection is closed"));
        }
        self.executed.push(sql.to_string());

        let response = self
            .responses
            .get(sql)
            .cloned()
            .unwrap_or_else(|| Self::unscripted(sql));

        match response {
            MockResponse::Rows {
                columns,
                rows,
                then_fail,
            } => {
                if matches!(then_fail, Some(MockFailure::Connection(_))) {
                    self.broken = true;
                }
                Ok(Outcome::Rows(Box::new(MockCursor {
                    columns,
                    rows: rows.into_iter(),
                    then_fail,
                })))
            }
            MockResponse::Update(count) => Ok(Outcome::Update(count)),
            MockResponse::Fail(failure) => {
                if matches!(failure, MockFailure::Connection(_)) {
                    self.broken = true;
                }
                Err(failure.to_error())
            }
        }
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}

struct MockCursor {
    columns: Vec<ColumnDescriptor>,
    rows: std::vec::IntoIter<Row>,
    then_fail: Option<MockFailure>,
}

#[async_trait]
impl RowCursor for MockCursor {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    async fn next_row(&mut self) -> Result<Option<Row>> {
        if let Some(row) = self.rows.next() {
            return Ok(Some(row));
        }
        match self.then_fail.take() {
            Some(failure) => Err(failure.to_error()),
            None => Ok(None),
        }
    }
}
