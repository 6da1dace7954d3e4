//! Tracing setup.
//!
//! The prompt owns stdout and stderr, so log lines go to a file unless
//! `--log-stderr` asks for them on the console.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "sqlprompt.log";

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    File,
    Stderr,
}

impl LogTarget {
    pub fn from_flag(log_stderr: bool) -> Self {
        if log_stderr {
            Self::Stderr
        } else {
            Self::File
        }
    }

    /// Filter used when `RUST_LOG` is unset. On stderr only problems show.
    fn default_level(self) -> &'static str {
        match self {
            Self::File => "info",
            Self::Stderr => "warn",
        }
    }
}

/// Installs the global subscriber.
///
/// An unwritable log file disables logging with a one-line warning; startup
/// carries on.
pub fn init(target: LogTarget) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(target.default_level()));

    match target {
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init(),
        LogTarget::File => match open_log_file(&log_path()) {
            Ok(file) => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init(),
            Err(e) => eprintln!("Warning: logging disabled: {e}"),
        },
    }
}

/// Creates the log file (and its directory), truncating any previous run.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    File::create(path)
}

/// `sqlprompt/sqlprompt.log` under the XDG state directory, else the config
/// directory, else the temp directory.
pub fn log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::config_dir)
        .map(|dir| dir.join("sqlprompt").join(LOG_FILE))
        .unwrap_or_else(|| std::env::temp_dir().join(LOG_FILE))
}
