//! End-to-end prompt tests against an in-memory SQLite database.

use super::run_session;
use pretty_assertions::assert_eq;
use sqlprompt::config::ConnectionConfig;
use sqlprompt::db::{Session, SqliteSession};
use sqlprompt::error::Severity;
use sqlprompt::prompt::SessionSummary;

async fn memory_session() -> SqliteSession {
    let config = ConnectionConfig::from_connection_string("sqlite::memory:").unwrap();
    SqliteSession::connect(&config).await.unwrap()
}

const SETUP: &str = "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)\n\
                     INSERT INTO people (name, age) VALUES ('Al', 31), ('Bo', NULL)\n";

/// Scenario: Create, fill and query a table
/// Given an empty database
/// When a table is created, two rows inserted and then selected
/// Then DDL prints ok, the insert reports 2 rows and the select prints a table
#[tokio::test]
async fn test_create_insert_select() {
    let input = format!("{SETUP}SELECT id, name, age FROM people ORDER BY id\n");
    let transcript = run_session(memory_session().await, &input).await;

    assert_eq!(
        transcript.result.unwrap(),
        SessionSummary {
            succeeded: 3,
            failed: 0
        }
    );
    assert_eq!(
        transcript.out,
        "ok\n\
         2 rows affected\n\
         +-----+------+------+\n\
         | id  | name | age  |\n\
         +-----+------+------+\n\
         |   1 | Al   |   31 |\n\
         |   2 | Bo   | null |\n\
         +-----+------+------+\n\
         2 rows"
    );
    assert!(transcript.err.is_empty());
}

#[tokio::test]
async fn test_update_counts() {
    let input = format!(
        "{SETUP}UPDATE people SET age = 40 WHERE name = 'Al'\n\
         DELETE FROM people WHERE id = 99\n\
         DROP TABLE people\n"
    );
    let transcript = run_session(memory_session().await, &input).await;

    let lines: Vec<_> = transcript.out.lines().collect();
    assert_eq!(
        lines,
        vec!["ok", "2 rows affected", "1 row affected", "0 rows affected", "ok"]
    );
}

#[tokio::test]
async fn test_empty_select_prints_header() {
    let input = format!("{SETUP}SELECT name FROM people WHERE 1 = 0\n");
    let transcript = run_session(memory_session().await, &input).await;

    assert!(transcript
        .out
        .ends_with("+------+\n| name |\n+------+\n+------+\n0 rows"));
}

/// Scenario: Statement errors do not end the session
/// Given a session with a table
/// When a statement references a missing table, then violates a key, then succeeds
/// Then both failures are reported on the error sink and the last statement runs
#[tokio::test]
async fn test_errors_are_recoverable() {
    let input = format!(
        "{SETUP}SELECT * FROM missing\n\
         INSERT INTO people (id, name) VALUES (1, 'Dup')\n\
         SELECT COUNT(*) AS n FROM people\n"
    );
    let transcript = run_session(memory_session().await, &input).await;

    let summary = transcript.result.unwrap();
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.succeeded, 3);

    let errors: Vec<_> = transcript.err.lines().collect();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("no such table: missing"), "{}", errors[0]);
    assert!(errors[1].starts_with("UniqueViolation: "), "{}", errors[1]);

    assert!(transcript.out.contains("|   2 |"));
    assert!(transcript.out.ends_with("1 row"));
}

#[tokio::test]
async fn test_syntax_error_reports_category() {
    let transcript = run_session(memory_session().await, "SELEC 1\n").await;

    assert_eq!(transcript.result.unwrap().failed, 1);
    let (category, message) = transcript.err.trim_end().split_once(": ").unwrap();
    assert!(!category.is_empty());
    assert!(message.contains("syntax error"));
}

/// Scenario: Large result is streamed in batches
/// Given a query producing 250 rows (more than one batch)
/// When it is rendered
/// Then every row is printed and the summary reads 250 rows
#[tokio::test]
async fn test_large_result() {
    let input = "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 250) \
                 SELECT x FROM n\n";
    let transcript = run_session(memory_session().await, input).await;

    assert_eq!(transcript.result.unwrap().succeeded, 1);
    assert!(transcript.out.ends_with("\n250 rows"));
    // Header and three separators, 250 data lines and the summary.
    assert_eq!(transcript.out.lines().count(), 255);
    assert!(transcript.out.contains("|   250 |"));
}

#[tokio::test]
async fn test_ping_before_first_statement() {
    let mut session = memory_session().await;
    session.ping().await.unwrap();

    let transcript = run_session(session, "").await;
    assert_eq!(transcript.result.unwrap(), SessionSummary::default());
}

#[tokio::test]
async fn test_missing_file_fails_before_loop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.db");
    let config =
        ConnectionConfig::from_connection_string(&format!("sqlite:{}", path.display())).unwrap();

    let err = SqliteSession::connect(&config).await.unwrap_err();
    assert_eq!(err.severity(), Severity::Fatal);
}

/// Scenario: Repeated query after a schema change
/// Given a table that has been selected from once
/// When a column is added and the same query runs again
/// Then the second result shows the new column
#[tokio::test]
async fn test_repeated_select_sees_added_column() {
    let input = "CREATE TABLE t (id INTEGER)\n\
                 INSERT INTO t VALUES (1)\n\
                 SELECT * FROM t\n\
                 ALTER TABLE t ADD COLUMN name TEXT DEFAULT 'zed'\n\
                 SELECT * FROM t\n";
    let transcript = run_session(memory_session().await, input).await;

    assert!(transcript.err.is_empty(), "{}", transcript.err);
    assert_eq!(transcript.result.unwrap().succeeded, 5);
    assert!(transcript.out.ends_with(
        "+-----+-------+\n\
         | id  | name  |\n\
         +-----+-------+\n\
         |   1 | zed   |\n\
         +-----+-------+\n\
         1 row"
    ));
}

#[tokio::test]
async fn test_repeated_select_after_dropped_column() {
    let input = "CREATE TABLE t (id INTEGER, name TEXT)\n\
                 INSERT INTO t VALUES (1, 'Al')\n\
                 SELECT * FROM t\n\
                 ALTER TABLE t DROP COLUMN name\n\
                 SELECT * FROM t\n";
    let transcript = run_session(memory_session().await, input).await;

    assert!(transcript.err.is_empty(), "{}", transcript.err);
    assert!(transcript
        .out
        .ends_with("+-----+\n| id  |\n+-----+\n|   1 |\n+-----+\n1 row"));
}
