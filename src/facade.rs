//! The caller-facing facade.
//!
//! `ConnectionFacade` owns at most one engine connection and routes every
//! operation through it. All logging happens under the dispatcher the facade
//! was built with.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info, Dispatch};

use crate::config::FacadeConfig;
use crate::engine::EngineConnection;
use crate::error::{FacadeError, Result};
use crate::interchange::{self, FileType, ReadOptions};
use crate::query::{QueryParams, ResultSet, Row, RowStream};
use crate::remote::{self, IdentityProvider};

/// Builder-style options for a [`ConnectionFacade`].
pub struct FacadeBuilder {
    config: FacadeConfig,
    identity: Option<Box<dyn IdentityProvider>>,
    dispatch: Option<Dispatch>,
}

impl FacadeBuilder {
    pub fn config(mut self, config: FacadeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn db_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_file = Some(path.into());
        self
    }

    pub fn identity_provider(mut self, provider: impl IdentityProvider + 'static) -> Self {
        self.identity = Some(Box::new(provider));
        self
    }

    /// Dispatcher used for every event the facade emits.
    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn build(self) -> ConnectionFacade {
        let dispatch = self
            .dispatch
            .unwrap_or_else(|| tracing::dispatcher::get_default(Dispatch::clone));
        let facade = ConnectionFacade {
            config: self.config,
            connection: None,
            identity: self
                .identity
                .unwrap_or_else(remote::default_identity_provider),
            dispatch,
        };
        facade.observe(|| debug!(db_file = ?facade.config.db_file, "facade initialized"));
        facade
    }
}

/// Connection lifecycle, remote storage, queries and file interchange over
/// one DuckDB connection.
///
/// Not meant for concurrent use: every operation takes `&mut self`, and a
/// live [`RowStream`] keeps the facade borrowed.
pub struct ConnectionFacade {
    config: FacadeConfig,
    connection: Option<EngineConnection>,
    identity: Box<dyn IdentityProvider>,
    dispatch: Dispatch,
}

impl ConnectionFacade {
    pub fn builder() -> FacadeBuilder {
        FacadeBuilder {
            config: FacadeConfig::default(),
            identity: None,
            dispatch: None,
        }
    }

    pub fn in_memory() -> Self {
        Self::builder().build()
    }

    pub fn with_db_file(path: impl Into<PathBuf>) -> Self {
        Self::builder().db_file(path).build()
    }

    pub fn from_config(config: FacadeConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &FacadeConfig {
        &self.config
    }

    pub fn db_file(&self) -> Option<&Path> {
        self.config.db_file.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn observe<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    fn connection(&self, operation: &str) -> Result<&EngineConnection> {
        self.connection.as_ref().ok_or_else(|| {
            let err = FacadeError::not_connected(operation);
            self.observe(|| tracing::error!(operation, error = %err, "no open connection"));
            err
        })
    }

    /// Open the engine. A second call keeps the existing connection.
    pub fn connect(&mut self) -> Result<()> {
        if self.connection.is_some() {
            self.observe(|| debug!("connection already open"));
            return Ok(());
        }
        let conn = self.observe(|| EngineConnection::open(&self.config))?;
        self.connection = Some(conn);
        Ok(())
    }

    /// Release the connection. Safe to call when nothing is open.
    pub fn close(&mut self) -> Result<()> {
        match self.connection.take() {
            Some(conn) => self.observe(|| conn.close()),
            None => Ok(()),
        }
    }

    /// Open, run `body`, and close again whether or not `body` succeeded.
    ///
    /// The body's error takes precedence over a close error.
    pub fn with_connection<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.connect()?;
        let outcome = body(self);
        let closed = self.close();
        let value = outcome?;
        closed?;
        Ok(value)
    }

    /// Verify cloud identity and make remote object storage readable and
    /// writable from this session.
    pub fn enable_remote_storage(&mut self) -> Result<()> {
        let conn = self.connection("enable_remote_storage")?;
        self.observe(|| {
            remote::enable_remote_storage(
                conn,
                &*self.identity,
                &self.config.remote_extensions,
            )
        })
    }

    pub fn execute_query(&mut self, sql: &str) -> Result<ResultSet> {
        self.execute_query_with_params(sql, QueryParams::None)
    }

    pub fn execute_query_with_params(
        &mut self,
        sql: &str,
        params: impl Into<QueryParams>,
    ) -> Result<ResultSet> {
        let params = params.into();
        let conn = self.connection("execute_query")?;
        self.observe(|| {
            info!("executing query: {sql}");
            conn.query(sql, &params, self.dispatch.clone())
        })
    }

    pub fn execute_query_streaming(&mut self, sql: &str) -> Result<RowStream<'_>> {
        self.execute_query_streaming_with_params(sql, QueryParams::None)
    }

    /// Like [`execute_query_with_params`](Self::execute_query_with_params)
    /// but rows are produced as the caller pulls them.
    pub fn execute_query_streaming_with_params(
        &mut self,
        sql: &str,
        params: impl Into<QueryParams>,
    ) -> Result<RowStream<'_>> {
        let params = params.into();
        let conn = self.connection("execute_query_streaming")?;
        let dispatch = self.dispatch.clone();
        tracing::dispatcher::with_default(&dispatch, || {
            info!("executing streaming query: {sql}");
            conn.query_stream(sql, &params, dispatch.clone())
        })
    }

    /// Read a CSV or Parquet file. `file_type` is checked before anything
    /// touches the engine.
    pub fn read_file(
        &mut self,
        path: &str,
        file_type: &str,
        options: &ReadOptions,
    ) -> Result<ResultSet> {
        let file_type = FileType::from_str(file_type)
            .map_err(|err| self.observe(|| log_rejected("read_file", err)))?;
        let conn = self.connection("read_file")?;
        self.observe(|| interchange::read_file(conn, path, file_type, options, self.dispatch.clone()))
    }

    pub fn create_table(&mut self, table_name: &str, dataset: &[Row]) -> Result<()> {
        if dataset.is_empty() {
            return Err(self.observe(|| {
                log_rejected(
                    "create_table",
                    FacadeError::Validation("no data provided to create the table".to_string()),
                )
            }));
        }
        let conn = self.connection("create_table")?;
        self.observe(|| interchange::create_table(conn, table_name, dataset))
    }

    pub fn save_as_file(&mut self, dataset: &[Row], destination: &str) -> Result<()> {
        if dataset.is_empty() {
            return Err(self.observe(|| {
                log_rejected(
                    "save_as_file",
                    FacadeError::Validation("no data provided to save".to_string()),
                )
            }));
        }
        let conn = self.connection("save_as_file")?;
        self.observe(|| interchange::save_as_file(conn, dataset, destination))
    }

    /// Export a table to `<directory>/<file_stem>.parquet` and return the path.
    pub fn save_table_as_file(
        &mut self,
        table_name: &str,
        directory: impl AsRef<Path>,
        file_stem: &str,
    ) -> Result<PathBuf> {
        let conn = self.connection("save_table_as_file")?;
        self.observe(|| {
            interchange::save_table_as_file(conn, table_name, directory.as_ref(), file_stem)
        })
    }
}

impl Drop for ConnectionFacade {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.take() {
            // close() already logged any failure
            let _ = self.observe(|| conn.close());
        }
    }
}

fn log_rejected(operation: &str, err: FacadeError) -> FacadeError {
    tracing::error!(operation, error = %err, "rejected invalid arguments");
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_is_idempotent_and_safe_before_connect() {
        let mut facade = ConnectionFacade::in_memory();
        assert!(facade.close().is_ok());
        facade.connect().unwrap();
        assert!(facade.is_connected());
        facade.close().unwrap();
        assert!(!facade.is_connected());
        assert!(facade.close().is_ok());
    }

    #[test]
    fn connect_twice_keeps_the_same_session() {
        let mut facade = ConnectionFacade::in_memory();
        facade.connect().unwrap();
        facade
            .execute_query("CREATE TABLE kept (id INTEGER)")
            .unwrap();
        facade.connect().unwrap();
        let tables = facade
            .execute_query("SELECT table_name FROM duckdb_tables() WHERE table_name = 'kept'")
            .unwrap();
        assert_eq!(tables.len(), 1);
    }
}
