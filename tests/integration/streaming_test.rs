//! Streaming result rendering against real servers.
//!
//! Tests that large results are printed batch by batch through the session
//! loop. These need DATABASE_URL (PostgreSQL) or MYSQL_URL (MySQL).

use super::run_session;
use sqlprompt::config::ConnectionConfig;
use sqlprompt::db::{MySqlSession, PostgresSession};

async fn get_postgres_session() -> Option<PostgresSession> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    PostgresSession::connect(&config).await.ok()
}

async fn get_mysql_session() -> Option<MySqlSession> {
    let url = std::env::var("MYSQL_URL").ok()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    MySqlSession::connect(&config).await.ok()
}

/// Scenario: Result larger than one batch
/// Given a query that returns 250 rows
/// When it runs through the prompt
/// Then all rows are printed and the summary reads 250 rows
#[tokio::test]
async fn test_postgres_large_result() {
    let Some(session) = get_postgres_session().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let transcript = run_session(session, "SELECT generate_series(1, 250) AS n\n").await;

    assert_eq!(transcript.result.unwrap().succeeded, 1);
    assert!(transcript.out.ends_with("\n250 rows"));
    assert_eq!(transcript.out.lines().count(), 255);
}

/// Scenario: Mixed alignment and NULLs
/// Given a query with a numeric, a text and a NULL column
/// When it runs through the prompt
/// Then numbers are right-justified, text is left-justified and NULL prints null
#[tokio::test]
async fn test_postgres_alignment() {
    let Some(session) = get_postgres_session().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let transcript = run_session(
        session,
        "SELECT 7 AS id, 'Al'::varchar AS name, NULL::int AS age\n",
    )
    .await;

    assert!(transcript.err.is_empty(), "{}", transcript.err);
    assert!(transcript.out.contains("| id  | name | age  |"));
    assert!(transcript.out.contains("|   7 | Al   | null |"));
    assert!(transcript.out.ends_with("1 row"));
}

/// Scenario: Server errors keep the session
/// Given a syntax error followed by a valid statement
/// When both run through the prompt
/// Then the error is reported with its category and the second statement runs
#[tokio::test]
async fn test_postgres_error_then_success() {
    let Some(session) = get_postgres_session().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let transcript = run_session(session, "SELEC 1\nSELECT 1 AS one\n").await;

    let summary = transcript.result.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);
    assert!(transcript.err.starts_with("SyntaxError: "));
    assert!(transcript.out.ends_with("1 row"));
}

#[tokio::test]
async fn test_mysql_large_result() {
    let Some(session) = get_mysql_session().await else {
        eprintln!("Skipping test: MYSQL_URL not set");
        return;
    };

    let input = "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 250) \
                 SELECT x FROM n\n";
    let transcript = run_session(session, input).await;

    assert_eq!(transcript.result.unwrap().succeeded, 1);
    assert!(transcript.out.ends_with("\n250 rows"));
}

#[tokio::test]
async fn test_mysql_ddl_prints_ok() {
    let Some(session) = get_mysql_session().await else {
        eprintln!("Skipping test: MYSQL_URL not set");
        return;
    };

    let input = "CREATE TEMPORARY TABLE sqlprompt_tmp (id INT)\n\
                 INSERT INTO sqlprompt_tmp VALUES (1), (2), (3)\n";
    let transcript = run_session(session, input).await;

    let lines: Vec<_> = transcript.out.lines().collect();
    assert_eq!(lines, vec!["ok", "3 rows affected"]);
}
