use std::sync::Arc;

use arrow_array::RecordBatch;
use duckdb::{params_from_iter, Connection, Statement};
use tracing::{debug, error, Dispatch};

use crate::error::{FacadeError, Result};
use crate::query::row::first_duplicate;
use crate::query::{QueryParams, Row};
use crate::sql;
use crate::types::arrow_array_to_values;

/// Lazy rows pulled from an executing statement.
///
/// Single pass and not restartable. The stream holds the facade's mutable
/// borrow, so no other statement can run on the connection until it is
/// exhausted or dropped. Dropping it early finalizes the statement and the
/// connection stays usable. After yielding an error the stream is fused.
pub struct RowStream<'conn> {
    stmt: Statement<'conn>,
    sql: String,
    columns: Arc<[String]>,
    pending: std::vec::IntoIter<Row>,
    yielded: usize,
    finished: bool,
    dispatch: Dispatch,
}

impl<'conn> RowStream<'conn> {
    /// Prepare, bind and execute `sql`, capturing the result columns.
    pub(crate) fn open(
        conn: &'conn Connection,
        sql: &str,
        params: &QueryParams,
        dispatch: Dispatch,
    ) -> Result<Self> {
        Self::start(conn, sql, params, dispatch).map_err(|err| {
            error!(sql = %sql, kind = err.kind(), error = %err, "query failed");
            err
        })
    }

    fn start(
        conn: &'conn Connection,
        sql: &str,
        params: &QueryParams,
        dispatch: Dispatch,
    ) -> Result<Self> {
        sql::check_statement(sql)?;
        let mut stmt = conn.prepare(sql)?;
        let values = params.bind_order(sql, stmt.parameter_count())?;
        stmt.execute(params_from_iter(values.iter()))?;

        let columns: Arc<[String]> = stmt.column_names().into();
        if let Some(name) = first_duplicate(&columns) {
            return Err(FacadeError::Validation(format!(
                "result has more than one column named '{name}'; alias them apart"
            )));
        }
        debug!(sql = %sql, columns = columns.len(), params = params.len(), "statement executed");

        Ok(Self {
            stmt,
            sql: sql.to_string(),
            finished: columns.is_empty(),
            columns,
            pending: Vec::new().into_iter(),
            yielded: 0,
            dispatch,
        })
    }

    /// Column names shared by every row this stream yields.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub(crate) fn column_list(&self) -> Arc<[String]> {
        Arc::clone(&self.columns)
    }

    /// Rows handed out so far.
    pub fn rows_yielded(&self) -> usize {
        self.yielded
    }

    fn advance(&mut self) -> Option<Result<Row>> {
        loop {
            if let Some(row) = self.pending.next() {
                self.yielded += 1;
                return Some(Ok(row));
            }
            let Some(chunk) = self.stmt.step() else {
                self.finished = true;
                debug!(sql = %self.sql, rows = self.yielded, "row stream exhausted");
                return None;
            };
            match batch_to_rows(&RecordBatch::from(chunk), &self.columns) {
                Ok(rows) => self.pending = rows.into_iter(),
                Err(err) => {
                    self.finished = true;
                    error!(
                        sql = %self.sql,
                        kind = err.kind(),
                        error = %err,
                        "failed to materialize result rows"
                    );
                    return Some(Err(err));
                }
            }
        }
    }
}

impl Iterator for RowStream<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let dispatch = self.dispatch.clone();
        tracing::dispatcher::with_default(&dispatch, || self.advance())
    }
}

impl Drop for RowStream<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::dispatcher::with_default(&self.dispatch, || {
                debug!(
                    sql = %self.sql,
                    rows = self.yielded,
                    "row stream dropped before exhaustion; finalizing statement"
                );
            });
        }
    }
}

/// Transpose a result chunk into rows sharing `columns`.
pub(crate) fn batch_to_rows(batch: &RecordBatch, columns: &Arc<[String]>) -> Result<Vec<Row>> {
    if batch.num_columns() != columns.len() {
        return Err(FacadeError::Execution(format!(
            "result chunk has {} columns but statement described {}",
            batch.num_columns(),
            columns.len()
        )));
    }

    let mut column_values = Vec::with_capacity(batch.num_columns());
    for column in batch.columns() {
        column_values.push(arrow_array_to_values(column)?.into_iter());
    }

    let mut rows = Vec::with_capacity(batch.num_rows());
    for _ in 0..batch.num_rows() {
        let values = column_values
            .iter_mut()
            .map(|values| values.next().unwrap_or(duckdb::types::Value::Null))
            .collect();
        rows.push(Row::with_columns(Arc::clone(columns), values)?);
    }
    Ok(rows)
}
