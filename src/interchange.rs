//! File and table interchange built on the query executor.
//!
//! In-memory datasets reach the engine through a staging relation: a
//! temporary table created from the dataset's inferred layout. Exporting a
//! dataset and creating a table from one both go through it, so they reuse
//! the same COPY and CREATE TABLE AS paths as table export.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use duckdb::types::Value;
use tracing::{error, info, instrument, Dispatch};

use crate::engine::EngineConnection;
use crate::error::{FacadeError, Result};
use crate::query::{QueryParams, ResultSet, Row};
use crate::sql;
use crate::types::StageType;

pub const PARQUET_EXTENSION: &str = "parquet";

/// File formats `read_file` understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    /// Columnar format.
    Parquet,
}

impl FileType {
    pub fn table_function(self) -> &'static str {
        match self {
            FileType::Csv => "read_csv",
            FileType::Parquet => "read_parquet",
        }
    }
}

impl FromStr for FileType {
    type Err = FacadeError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "csv" => Ok(FileType::Csv),
            "parquet" | "columnar" => Ok(FileType::Parquet),
            _ => Err(FacadeError::Validation(format!(
                "file_type must be either 'csv' or 'parquet', got '{value}'"
            ))),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Csv => f.write_str("csv"),
            FileType::Parquet => f.write_str("parquet"),
        }
    }
}

/// Optional projection and filters for [`read_file`].
///
/// Both are raw SQL fragments inserted without escaping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub select_columns: Vec<String>,
    pub filter_conditions: Vec<String>,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Add a condition; all conditions are ANDed together.
    pub fn filter(mut self, condition: impl Into<String>) -> Self {
        self.filter_conditions.push(condition.into());
        self
    }
}

/// Column names and staging types inferred from a dataset.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StagingLayout {
    columns: Vec<(String, StageType)>,
}

impl StagingLayout {
    /// Columns are the union of keys in first-seen order. Each column's type
    /// is the widening of all its non-NULL values; all-NULL columns are
    /// VARCHAR.
    pub(crate) fn infer(dataset: &[Row]) -> Result<Self> {
        let mut columns: Vec<(String, Option<StageType>)> = Vec::new();
        for row in dataset {
            for (name, value) in row.iter() {
                let stage_type = StageType::of(value)?;
                match columns.iter_mut().find(|(column, _)| column == name) {
                    Some((_, slot)) => {
                        *slot = match (*slot, stage_type) {
                            (Some(seen), Some(next)) => Some(seen.widen(next)),
                            (seen, next) => seen.or(next),
                        }
                    }
                    None => columns.push((name.to_string(), stage_type)),
                }
            }
        }
        Ok(Self {
            columns: columns
                .into_iter()
                .map(|(name, stage_type)| (name, stage_type.unwrap_or(StageType::Varchar)))
                .collect(),
        })
    }

    fn column_definitions(&self) -> Vec<(String, String)> {
        self.columns
            .iter()
            .map(|(name, stage_type)| (name.clone(), stage_type.sql_type()))
            .collect()
    }

    fn insert_statement(&self, table: &str) -> String {
        let expressions: Vec<String> = self
            .columns
            .iter()
            .map(|(_, stage_type)| stage_type.placeholder())
            .collect();
        sql::insert_values(table, &expressions)
    }

    fn bind_values(&self, row: &Row) -> Result<Vec<Value>> {
        self.columns
            .iter()
            .map(|(name, stage_type)| match row.get(name) {
                Some(value) => stage_type.bind_value(value).map_err(|err| {
                    FacadeError::Validation(format!("column '{name}': {err}"))
                }),
                None => Ok(Value::Null),
            })
            .collect()
    }
}

/// Stage `dataset` as a temporary relation and return its name.
///
/// Every row is converted before the relation is created. If loading fails
/// the relation is dropped again.
#[instrument(skip_all, fields(rows = dataset.len()))]
fn stage_dataset(conn: &EngineConnection, dataset: &[Row]) -> Result<String> {
    if dataset.is_empty() {
        return Err(FacadeError::Validation(
            "no data provided to stage".to_string(),
        ));
    }
    let layout = StagingLayout::infer(dataset)?;
    let rows = dataset
        .iter()
        .map(|row| layout.bind_values(row))
        .collect::<Result<Vec<_>>>()?;

    let name = sql::staging_table_name();
    conn.execute_batch(&sql::create_staging_table(&name, &layout.column_definitions()))?;
    if let Err(err) = conn.execute_for_each(&layout.insert_statement(&name), rows) {
        discard_stage(conn, &name);
        return Err(err);
    }
    Ok(name)
}

/// Run `statement` against a freshly staged copy of `dataset`, then drop
/// the staging relation whether or not the statement succeeded.
fn with_stage(
    conn: &EngineConnection,
    dataset: &[Row],
    statement: impl FnOnce(&str) -> String,
) -> Result<()> {
    let stage = stage_dataset(conn, dataset)?;
    let outcome = conn.execute_batch(&statement(&stage));
    discard_stage(conn, &stage);
    outcome
}

fn discard_stage(conn: &EngineConnection, stage: &str) {
    // execute_batch already logged the failure
    let _ = conn.execute_batch(&sql::drop_table_if_exists(stage));
}

/// Write `dataset` to `destination` as Parquet.
#[instrument(skip(conn, dataset), fields(rows = dataset.len()))]
pub fn save_as_file(conn: &EngineConnection, dataset: &[Row], destination: &str) -> Result<()> {
    info!("saving data to Parquet file at '{destination}'");
    with_stage(conn, dataset, |stage| {
        sql::copy_relation_to_parquet(stage, destination)
    })
    .map_err(|err| {
        error!(path = %destination, error = %err, "error saving Parquet file");
        err
    })?;
    info!("data saved to '{destination}' successfully");
    Ok(())
}

/// Select from a CSV or Parquet file, local or remote.
#[instrument(skip(conn, options, dispatch), fields(file_type = %file_type))]
pub fn read_file(
    conn: &EngineConnection,
    path: &str,
    file_type: FileType,
    options: &ReadOptions,
    dispatch: Dispatch,
) -> Result<ResultSet> {
    info!("reading {} file from '{path}'", file_type.to_string().to_uppercase());
    let query = sql::read_file(
        path,
        file_type,
        &options.select_columns,
        &options.filter_conditions,
    );
    let result = conn
        .query(&query, &QueryParams::None, dispatch)
        .map_err(|err| {
            error!(path = %path, error = %err, "error reading {file_type} file");
            err
        })?;
    info!(rows = result.len(), "data read from '{path}' successfully");
    Ok(result)
}

/// Create `table_name` from `dataset`, letting column types follow the data.
#[instrument(skip(conn, dataset), fields(rows = dataset.len()))]
pub fn create_table(conn: &EngineConnection, table_name: &str, dataset: &[Row]) -> Result<()> {
    info!("creating table '{table_name}'");
    with_stage(conn, dataset, |stage| sql::create_table_as(table_name, stage)).map_err(|err| {
        error!(table = %table_name, error = %err, "error creating table");
        err
    })?;
    info!(
        "table '{table_name}' created successfully with {} rows",
        dataset.len()
    );
    Ok(())
}

/// Export `table_name` to `<directory>/<file_stem>.parquet`.
#[instrument(skip(conn, directory), fields(directory = %directory.display()))]
pub fn save_table_as_file(
    conn: &EngineConnection,
    table_name: &str,
    directory: &Path,
    file_stem: &str,
) -> Result<PathBuf> {
    let full_path = directory.join(format!("{file_stem}.{PARQUET_EXTENSION}"));
    let destination = full_path.to_string_lossy();
    info!("saving table '{table_name}' as Parquet file: {destination}");
    conn.execute_batch(&sql::copy_table_to_parquet(table_name, &destination))
        .map_err(|err| {
            error!(table = %table_name, path = %destination, error = %err, "error saving table as Parquet");
            err
        })?;
    info!("table '{table_name}' successfully saved as Parquet file: {destination}");
    Ok(full_path)
}
