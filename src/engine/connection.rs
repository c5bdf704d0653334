//! Owned DuckDB connection with execution helpers.
//!
//! The facade keeps at most one of these alive. Everything runs on the
//! caller's thread; there is no pooling and no interior locking.

use std::path::{Path, PathBuf};

use duckdb::types::Value;
use duckdb::{params_from_iter, Config, Connection};
use tracing::{debug, error, info, instrument, Dispatch};

use crate::config::FacadeConfig;
use crate::error::{FacadeError, Result};
use crate::query::{QueryParams, ResultSet, RowStream};
use crate::sql;

pub struct EngineConnection {
    conn: Connection,
    path: Option<PathBuf>,
}

impl EngineConnection {
    /// Open the configured database file, or an in-memory database when
    /// `db_file` is unset. Failures are not retried.
    #[instrument(skip(config), fields(db_file = ?config.db_file))]
    pub fn open(config: &FacadeConfig) -> Result<Self> {
        let flags = Self::engine_config(config).map_err(|err| {
            FacadeError::Connectivity(format!("invalid DuckDB configuration: {err}"))
        })?;

        let conn = match config.db_file.as_deref() {
            Some(path) => {
                let conn = Connection::open_with_flags(path, flags).map_err(|err| {
                    FacadeError::Connectivity(format!(
                        "failed to open DuckDB database {}: {err}",
                        path.display()
                    ))
                })?;
                info!(db_file = %path.display(), "DuckDB connection established with database file");
                conn
            }
            None => {
                let conn = Connection::open_in_memory_with_flags(flags).map_err(|err| {
                    FacadeError::Connectivity(format!(
                        "failed to open in-memory DuckDB database: {err}"
                    ))
                })?;
                info!("in-memory DuckDB connection established");
                conn
            }
        };

        Ok(Self {
            conn,
            path: config.db_file.clone(),
        })
    }

    fn engine_config(config: &FacadeConfig) -> duckdb::Result<Config> {
        let mut flags = Config::default().enable_autoload_extension(config.autoload_extensions)?;
        if config.allow_unsigned_extensions {
            flags = flags.allow_unsigned_extensions()?;
        }
        if let Some(threads) = config.threads {
            flags = flags.threads(i64::from(threads))?;
        }
        Ok(flags)
    }

    /// Backing file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Execute one or more statements that return no rows.
    #[instrument(skip(self), fields(sql = %sql))]
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        sql::check_statement(sql)?;
        self.conn
            .execute_batch(sql)
            .map_err(FacadeError::from)
            .map_err(|err| {
                error!(sql = %sql, kind = err.kind(), error = %err, "statement failed");
                err
            })?;
        debug!("executed batch");
        Ok(())
    }

    /// Run one prepared statement once per parameter row.
    #[instrument(skip(self, rows), fields(sql = %sql))]
    pub fn execute_for_each<I>(&self, sql: &str, rows: I) -> Result<usize>
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        let run = || -> Result<usize> {
            let mut stmt = self.conn.prepare(sql)?;
            let mut count = 0usize;
            for values in rows {
                stmt.execute(params_from_iter(values.iter()))?;
                count += 1;
            }
            Ok(count)
        };
        let count = run().map_err(|err| {
            error!(sql = %sql, kind = err.kind(), error = %err, "statement failed");
            err
        })?;
        debug!(rows = count, "executed statement for each row");
        Ok(count)
    }

    /// Start a query and return its lazy rows.
    pub fn query_stream(
        &self,
        sql: &str,
        params: &QueryParams,
        dispatch: Dispatch,
    ) -> Result<RowStream<'_>> {
        RowStream::open(&self.conn, sql, params, dispatch)
    }

    /// Execute a query and drain every row.
    #[instrument(skip(self, params, dispatch), fields(sql = %sql, param_count = params.len()))]
    pub fn query(&self, sql: &str, params: &QueryParams, dispatch: Dispatch) -> Result<ResultSet> {
        let mut stream = self.query_stream(sql, params, dispatch)?;
        let columns = stream.column_list();
        let rows = stream.by_ref().collect::<Result<Vec<_>>>()?;
        info!(rows = rows.len(), "query executed successfully");
        Ok(ResultSet::new(columns, rows))
    }

    /// Close the underlying handle. The handle is released even on error.
    #[instrument(skip(self), fields(db_file = ?self.path))]
    pub fn close(self) -> Result<()> {
        match self.conn.close() {
            Ok(()) => {
                info!("database connection closed");
                Ok(())
            }
            Err((conn, err)) => {
                error!(error = %err, "failed to close DuckDB connection cleanly");
                drop(conn);
                Err(FacadeError::Execution(format!(
                    "failed to close DuckDB connection: {err}"
                )))
            }
        }
    }
}
