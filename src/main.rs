//! sqlprompt - a line-oriented interactive SQL prompt.

use sqlprompt::cli::Cli;
use sqlprompt::{app, logging};
use std::process::ExitCode;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();

    logging::init(logging::LogTarget::from_flag(cli.log_stderr));

    match app::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
