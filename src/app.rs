//! Application wiring for sqlprompt.
//!
//! Resolves which database to talk to, opens exactly one session for it and
//! hands the console over to the session loop.

use crate::cli::{Cli, FieldArg};
use crate::config::{Config, ConnectionConfig};
use crate::db::{
    DatabaseBackend, MockSession, MySqlSession, PostgresSession, Session, SqliteSession,
};
use crate::error::{PromptError, Result};
use crate::prompt::SessionLoop;
use std::io::{BufRead, IsTerminal, Write};
use std::process::ExitCode;
use tracing::{info, warn};

/// Runs the prompt as configured by `cli`.
///
/// Returns `Err` only for failures before the loop starts (configuration,
/// connecting). Failures inside the loop have already been reported on
/// stderr and map to a failing exit code.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;
    let prompt = config.prompt.text.clone();

    let mut input = std::io::stdin().lock();

    if cli.mock_db {
        info!("Using mock database");
        return drive(MockSession::new(), input, &prompt).await;
    }

    let mut connection = resolve_connection(&cli, &config)?;

    if connection.backend.is_networked() {
        let mut stderr = std::io::stderr();
        apply_field_markers(&cli, &mut connection, &mut input, &mut stderr)?;

        if std::io::stdin().is_terminal() {
            prompt_missing_fields(&mut connection, &mut input, &mut stderr)?;
            if connection.password.is_none() && !cli.no_password {
                let password = rpassword::prompt_password("Password: ")?;
                connection.password = Some(password).filter(|p| !p.is_empty());
            }
        }
    }

    info!("Connecting to {}", connection.display_string());
    match connection.backend {
        DatabaseBackend::MySql => {
            let session = MySqlSession::connect(&connection).await?;
            drive(session, input, &prompt).await
        }
        DatabaseBackend::Postgres => {
            let session = PostgresSession::connect(&connection).await?;
            drive(session, input, &prompt).await
        }
        DatabaseBackend::Sqlite => {
            let session = SqliteSession::connect(&connection).await?;
            drive(session, input, &prompt).await
        }
    }
}

/// Runs the session loop on the process console and closes the session on a clean exit.
async fn drive<S, R>(session: S, input: R, prompt: &str) -> Result<ExitCode>
where
    S: Session,
    R: BufRead,
{
    let mut session_loop = SessionLoop::new(
        session,
        input,
        std::io::stdout().lock(),
        std::io::stderr(),
    )
    .with_prompt(prompt);

    match session_loop.run().await {
        Ok(summary) => {
            info!(
                "Session finished: {} succeeded, {} failed",
                summary.succeeded, summary.failed
            );
            if let Err(e) = session_loop.into_session().close().await {
                warn!("Failed to close session cleanly: {e}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
///
/// Precedence: connection string, then the named (or default) config
/// connection with individual CLI flags layered on top, then
/// backend-specific environment variables for anything still unset.
pub fn resolve_connection(cli: &Cli, config: &Config) -> Result<ConnectionConfig> {
    let mut connection = if let Some(conn_str) = &cli.connection_string {
        ConnectionConfig::from_connection_string(conn_str)?
    } else {
        let mut base = match cli.connection_name() {
            Some(name) => config.get_connection(Some(name)).cloned().ok_or_else(|| {
                PromptError::config(format!("Connection '{name}' not found in config file"))
            })?,
            None => config.get_connection(None).cloned().unwrap_or_default(),
        };
        base.merge(&cli.connection_overrides());
        if let Some(backend) = cli.backend {
            base.backend = backend;
        }
        base
    };

    connection.apply_env_defaults();
    Ok(connection)
}

/// Asks for every connection field that is still unset.
///
/// The port offers the backend default and the database offers the user name.
pub fn prompt_missing_fields<R, W>(
    connection: &mut ConnectionConfig,
    input: &mut R,
    output: &mut W,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    if connection.host.is_none() {
        connection.host = prompt_field(input, output, "Host", None)?;
    }

    if connection.port.is_none() {
        let default_port = connection.backend.default_port().to_string();
        if let Some(port) = prompt_field(input, output, "Port", Some(&default_port))? {
            connection.port = Some(parse_port(&port)?);
        }
    }

    if connection.user.is_none() {
        let login = login_name();
        connection.user = prompt_field(input, output, "User", login.as_deref())?;
    }

    if connection.database.is_none() {
        let default_db = connection.user.clone();
        connection.database = prompt_field(input, output, "Database", default_db.as_deref())?;
    }

    Ok(())
}

/// Settles fields given as `-` (ask now) or `+` (take the default).
///
/// Unlike [`prompt_missing_fields`], asking happens even when stdin is not a
/// terminal. Fields are settled in prompt order so the database default sees
/// the final user.
pub fn apply_field_markers<R, W>(
    cli: &Cli,
    connection: &mut ConnectionConfig,
    input: &mut R,
    output: &mut W,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    if let Some(host) = settle_field(cli.host.as_ref(), input, output, "Host", Some("localhost"))?
    {
        connection.host = host;
    }

    let default_port = connection.backend.default_port().to_string();
    if let Some(port) =
        settle_field(cli.port.as_ref(), input, output, "Port", Some(&default_port))?
    {
        connection.port = port.as_deref().map(parse_port).transpose()?;
    }

    let login = login_name();
    if let Some(user) = settle_field(cli.user.as_ref(), input, output, "User", login.as_deref())? {
        connection.user = user;
    }

    let default_db = connection.user.clone();
    if let Some(database) =
        settle_field(cli.database.as_ref(), input, output, "Database", default_db.as_deref())?
    {
        connection.database = database;
    }

    Ok(())
}

/// Returns the new value for a marked field, or `None` if it was not marked.
fn settle_field<T, R, W>(
    arg: Option<&FieldArg<T>>,
    input: &mut R,
    output: &mut W,
    what: &str,
    default: Option<&str>,
) -> Result<Option<Option<String>>>
where
    R: BufRead,
    W: Write,
{
    match arg {
        Some(FieldArg::Ask) => Ok(Some(prompt_field(input, output, what, default)?)),
        Some(FieldArg::UseDefault) => Ok(Some(default.map(String::from))),
        Some(FieldArg::Value(_)) | None => Ok(None),
    }
}

fn parse_port(port: &str) -> Result<u16> {
    port.parse::<u16>()
        .map_err(|_| PromptError::config(format!("Invalid port: '{port}'")))
}

fn login_name() -> Option<String> {
    std::env::var("USER").ok()
}

/// Prompts for one value, with an optional default shown in brackets.
///
/// An empty answer (or end of input) yields the default.
pub fn prompt_field<R, W>(
    input: &mut R,
    output: &mut W,
    what: &str,
    default: Option<&str>,
) -> Result<Option<String>>
where
    R: BufRead,
    W: Write,
{
    match default {
        Some(default) => write!(output, "{what} [{default}]: ")?,
        None => write!(output, "{what}: ")?,
    }
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();

    if answer.is_empty() {
        Ok(default.map(String::from))
    } else {
        Ok(Some(answer.to_string()))
    }
}
