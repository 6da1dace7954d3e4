//! Interactive statement prompt.
//!
//! The session loop reads one statement per line and hands row results to
//! the table renderer.

mod render;
mod session_loop;

pub use render::{
    elapsed_suffix, fetch_batch, row_summary, update_summary, ColumnLayout, TableRenderer,
    BATCH_CAPACITY,
};
pub use session_loop::{SessionLoop, SessionSummary, DEFAULT_PROMPT};
