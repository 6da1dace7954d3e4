//! sqlprompt - a line-oriented interactive SQL prompt.
//!
//! This library exposes the core modules for use by the binary and in
//! integration tests.

pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod prompt;
