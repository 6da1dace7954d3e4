//! Streaming result rendering.
//!
//! Prints statement results as ASCII bordered tables, pulling rows from the
//! cursor in fixed-size batches so memory stays bounded for any result size.

use crate::db::{ColumnDescriptor, Row, RowCursor};
use crate::error::Result;
use std::io::Write;
use std::time::Duration;

/// Number of rows fetched per batch.
pub const BATCH_CAPACITY: usize = 100;

/// Width contributed by a NULL cell (the `null` marker).
const NULL_WIDTH: usize = 4;

/// Padding added to every cell value when sizing columns.
const VALUE_PAD: usize = 2;

/// Text printed for a NULL cell.
const NULL_MARKER: &str = "null";

/// Renders row results as bordered tables.
#[derive(Debug, Clone)]
pub struct TableRenderer {
    batch_capacity: usize,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    /// Creates a renderer with the default batch capacity.
    pub fn new() -> Self {
        Self {
            batch_capacity: BATCH_CAPACITY,
        }
    }

    /// Creates a renderer that fetches `capacity` rows at a time (at least one).
    pub fn with_batch_capacity(capacity: usize) -> Self {
        Self {
            batch_capacity: capacity.max(1),
        }
    }

    /// Returns the number of rows fetched per batch.
    pub fn batch_capacity(&self) -> usize {
        self.batch_capacity
    }

    /// Drains `cursor` into `out` as a table and returns the number of rows printed.
    ///
    /// Column widths are computed from the first batch only. A wider value in a
    /// later batch overflows its cell and misaligns that one row.
    ///
    /// The trailing `N rows` summary is written without a newline so the
    /// caller can append the elapsed time.
    pub async fn render<C, W>(&self, cursor: &mut C, out: &mut W) -> Result<usize>
    where
        C: RowCursor + ?Sized,
        W: Write + ?Sized,
    {
        let mut batch = fetch_batch(cursor, self.batch_capacity).await?;
        let layout = ColumnLayout::new(cursor.columns(), &batch);

        let separator = layout.separator();
        writeln!(out, "{separator}")?;
        writeln!(out, "{}", layout.header())?;
        writeln!(out, "{separator}")?;

        let mut total = 0;
        while !batch.is_empty() {
            for row in &batch {
                writeln!(out, "{}", layout.data_row(row))?;
            }
            total += batch.len();
            batch = fetch_batch(cursor, self.batch_capacity).await?;
        }

        writeln!(out, "{separator}")?;
        write!(out, "{}", row_summary(total))?;
        Ok(total)
    }
}

/// Advances `cursor` up to `capacity` times and returns the rows read.
///
/// An empty batch means the cursor is exhausted.
pub async fn fetch_batch<C>(cursor: &mut C, capacity: usize) -> Result<Vec<Row>>
where
    C: RowCursor + ?Sized,
{
    let mut batch = Vec::with_capacity(capacity);
    while batch.len() < capacity {
        match cursor.next_row().await? {
            Some(row) => batch.push(row),
            None => break,
        }
    }
    Ok(batch)
}

/// Frozen column widths plus the row templates derived from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: Vec<ColumnDescriptor>,
    widths: Vec<usize>,
}

impl ColumnLayout {
    /// Computes widths from the header names and the first batch of rows.
    pub fn new(columns: &[ColumnDescriptor], first_batch: &[Row]) -> Self {
        let mut widths: Vec<usize> = columns.iter().map(|c| c.name.chars().count()).collect();

        for row in first_batch {
            for (width, cell) in widths.iter_mut().zip(row) {
                let cell_width = match cell {
                    Some(value) => value.chars().count() + VALUE_PAD,
                    None => NULL_WIDTH,
                };
                *width = (*width).max(cell_width);
            }
        }

        Self {
            columns: columns.to_vec(),
            widths,
        }
    }

    /// Column widths, one per column.
    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    /// `+-----+------+` style border line.
    pub fn separator(&self) -> String {
        let mut line = String::from("+");
        for &width in &self.widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    }

    /// Header line with every name left-justified.
    pub fn header(&self) -> String {
        let mut line = String::new();
        for (column, &width) in self.columns.iter().zip(&self.widths) {
            line.push_str(&format!("| {:<width$} ", column.name));
        }
        line.push('|');
        line
    }

    /// Data line; textual columns are left-justified, all others right-justified.
    pub fn data_row(&self, row: &Row) -> String {
        let mut line = String::new();
        for (index, (column, &width)) in self.columns.iter().zip(&self.widths).enumerate() {
            let value = row
                .get(index)
                .and_then(|cell| cell.as_deref())
                .unwrap_or(NULL_MARKER);
            if column.is_textual {
                line.push_str(&format!("| {value:<width$} "));
            } else {
                line.push_str(&format!("| {value:>width$} "));
            }
        }
        line.push('|');
        line
    }
}

/// `1 row` or `N rows`.
pub fn row_summary(count: usize) -> String {
    if count == 1 {
        "1 row".to_string()
    } else {
        format!("{count} rows")
    }
}

/// Acknowledgement for a statement that produced no rows.
///
/// A negative count means no count applies and renders as `ok`.
pub fn update_summary(count: i64) -> String {
    match count {
        c if c < 0 => "ok".to_string(),
        1 => "1 row affected".to_string(),
        c => format!("{c} rows affected"),
    }
}

/// ` (X.XX seconds)` suffix appended after every outcome.
pub fn elapsed_suffix(elapsed: Duration) -> String {
    format!(" ({:.2} seconds)", elapsed.as_secs_f64())
}
