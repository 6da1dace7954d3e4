//! Row cursor over a sqlx row stream.

use super::{ColumnDescriptor, Row, RowCursor};
use crate::error::Result;
use async_trait::async_trait;
use futures::future;
use futures::stream::{self, BoxStream, Fuse};
use futures::{StreamExt, TryStreamExt};
use sqlx::Either;

/// Stringifies one cell of a driver row.
pub(crate) type CellReader<R> = fn(&R, usize) -> std::result::Result<Option<String>, sqlx::Error>;

/// How an undescribed statement's results begin.
pub(crate) enum ResultStart<'a, R> {
    /// A row arrived; `rows` yields it again followed by the rest.
    Rows {
        columns: Vec<ColumnDescriptor>,
        rows: BoxStream<'a, std::result::Result<R, sqlx::Error>>,
    },
    /// The results ended without a row; the summed affected-row count.
    Done(u64),
}

/// Reads results until the first row or the end of the stream.
///
/// `results` yields affected-row counts on the left and rows on the right.
/// Columns are taken from the first row since nothing described them up front.
pub(crate) async fn peek_rows<'a, R>(
    mut results: BoxStream<'a, std::result::Result<Either<u64, R>, sqlx::Error>>,
    describe: fn(&R) -> Vec<ColumnDescriptor>,
) -> std::result::Result<ResultStart<'a, R>, sqlx::Error>
where
    R: Send + 'a,
{
    let mut rows_affected = 0;
    while let Some(step) = results.try_next().await? {
        match step {
            Either::Left(count) => rows_affected += count,
            Either::Right(first) => {
                let columns = describe(&first);
                let rest = results.try_filter_map(|step| future::ready(Ok(step.right())));
                let rows = stream::once(future::ready(Ok(first))).chain(rest).boxed();
                return Ok(ResultStart::Rows { columns, rows });
            }
        }
    }

    Ok(ResultStart::Done(rows_affected))
}

/// Cursor that pulls rows one at a time from a streaming query.
///
/// Nothing is buffered beyond what the driver itself holds.
pub(crate) struct StreamCursor<'a, R> {
    columns: Vec<ColumnDescriptor>,
    rows: Fuse<BoxStream<'a, std::result::Result<R, sqlx::Error>>>,
    read_cell: CellReader<R>,
}

impl<'a, R> StreamCursor<'a, R> {
    pub(crate) fn new(
        columns: Vec<ColumnDescriptor>,
        rows: BoxStream<'a, std::result::Result<R, sqlx::Error>>,
        read_cell: CellReader<R>,
    ) -> Self {
        Self {
            columns,
            rows: rows.fuse(),
            read_cell,
        }
    }
}

#[async_trait]
impl<'a, R> RowCursor for StreamCursor<'a, R>
where
    R: Send + 'a,
{
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    async fn next_row(&mut self) -> Result<Option<Row>> {
        let Some(row) = self.rows.try_next().await? else {
            return Ok(None);
        };

        let cells = (0..self.columns.len())
            .map(|index| (self.read_cell)(&row, index))
            .collect::<std::result::Result<Row, sqlx::Error>>()?;

        Ok(Some(cells))
    }
}
