//! The read-execute-render loop.
//!
//! One statement per input line is executed against a single owned session.
//! Statement-level failures are reported and skipped; anything that leaves the
//! session (or the console) unusable ends the loop.

use super::render::{elapsed_suffix, update_summary, TableRenderer};
use crate::db::{Outcome, Session};
use crate::error::{PromptError, Result, Severity};
use std::io::{BufRead, Write};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Default prompt text.
pub const DEFAULT_PROMPT: &str = "sql> ";

/// Statement counts for one completed session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Statements that ran and were rendered.
    pub succeeded: usize,
    /// Statements the server (or driver) rejected.
    pub failed: usize,
}

/// Drives one session from a line source to an output and an error sink.
pub struct SessionLoop<S, R, W, E> {
    session: S,
    input: R,
    out: W,
    err: E,
    prompt: String,
    renderer: TableRenderer,
}

impl<S, R, W, E> SessionLoop<S, R, W, E>
where
    S: Session,
    R: BufRead,
    W: Write,
    E: Write,
{
    /// Creates a loop over an open session and the given console handles.
    pub fn new(session: S, input: R, out: W, err: E) -> Self {
        Self {
            session,
            input,
            out,
            err,
            prompt: DEFAULT_PROMPT.to_string(),
            renderer: TableRenderer::new(),
        }
    }

    /// Sets the text written before each line is read.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Replaces the table renderer.
    pub fn with_renderer(mut self, renderer: TableRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Returns the session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Consumes the loop and returns the session.
    pub fn into_session(self) -> S {
        self.session
    }

    /// Runs until end of input (`Ok`) or a fatal failure (`Err`).
    ///
    /// Fatal errors have already been reported on the error sink when returned.
    pub async fn run(&mut self) -> Result<SessionSummary> {
        if let Err(e) = self.session.ping().await {
            return Err(self.report_fatal(e));
        }

        let mut summary = SessionSummary::default();
        let mut line = String::new();

        loop {
            line.clear();
            match self.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => return Err(self.report_fatal(e)),
            }

            let sql = line.trim();
            if sql.is_empty() {
                continue;
            }

            debug!(sql, "Executing statement");
            let started = Instant::now();
            match self.execute(sql, started).await {
                Ok(()) => summary.succeeded += 1,
                Err(e) if e.severity() == Severity::Recoverable => {
                    warn!("Statement failed: {e}");
                    if let Err(io) = self.report_recoverable(&e) {
                        return Err(self.report_fatal(io));
                    }
                    summary.failed += 1;
                }
                Err(e) => return Err(self.report_fatal(e)),
            }
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "End of input"
        );
        Ok(summary)
    }

    fn read_line(&mut self, line: &mut String) -> Result<usize> {
        write!(self.out, "{}", self.prompt)?;
        self.out.flush()?;
        Ok(self.input.read_line(line)?)
    }

    async fn execute(&mut self, sql: &str, started: Instant) -> Result<()> {
        match self.session.execute(sql).await? {
            Outcome::Rows(mut cursor) => {
                let rows = self.renderer.render(cursor.as_mut(), &mut self.out).await?;
                debug!(rows, "Rendered result");
            }
            Outcome::Update(count) => write!(self.out, "{}", update_summary(count))?,
        }

        writeln!(self.out, "{}", elapsed_suffix(started.elapsed()))?;
        self.out.flush()?;
        Ok(())
    }

    fn report_recoverable(&mut self, e: &PromptError) -> Result<()> {
        self.out.flush()?;
        writeln!(self.err, "{e}")?;
        self.err.flush()?;
        Ok(())
    }

    fn report_fatal(&mut self, e: PromptError) -> PromptError {
        error!("Session terminated: {e}");
        // Best effort: the sinks themselves may be what failed.
        let _ = self.out.flush();
        let _ = writeln!(self.err, "fatal: {e}");
        let _ = self.err.flush();
        e
    }
}
