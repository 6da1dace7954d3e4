//! Integration tests for sqlprompt.

pub mod connection_test;
pub mod sqlite_test;
pub mod streaming_test;

use sqlprompt::db::Session;
use sqlprompt::error::Result;
use sqlprompt::prompt::{SessionLoop, SessionSummary};

/// Output of one scripted session.
pub struct Transcript {
    pub result: Result<SessionSummary>,
    pub out: String,
    pub err: String,
}

/// Runs `input` through a session loop with an empty prompt.
pub async fn run_session<S: Session>(session: S, input: &str) -> Transcript {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = {
        let mut session_loop =
            SessionLoop::new(session, input.as_bytes(), &mut out, &mut err).with_prompt("");
        session_loop.run().await
    };

    Transcript {
        result,
        out: strip_timing(&String::from_utf8_lossy(&out)),
        err: String::from_utf8_lossy(&err).into_owned(),
    }
}

/// Drops the ` (X.XX seconds)` suffix from every line.
pub fn strip_timing(text: &str) -> String {
    text.lines()
        .map(|line| match line.rfind(" (") {
            Some(index) if line.ends_with(" seconds)") => &line[..index],
            _ => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
