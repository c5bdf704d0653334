//! Statement text for every interchange and session operation.
//!
//! String literals (paths, option values) are quoted here. Table names,
//! selected columns and filter conditions are caller-supplied SQL fragments
//! and go in verbatim; keeping them safe is the caller's job.

use uuid::Uuid;

use crate::error::{FacadeError, Result};
use crate::interchange::FileType;

/// Reject statement text the engine's C interface would silently truncate.
pub fn check_statement(sql: &str) -> Result<()> {
    if sql.contains('\0') {
        return Err(FacadeError::Validation(
            "SQL contains null bytes".to_string(),
        ));
    }
    Ok(())
}

/// Single-quote a string literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn read_file(
    path: &str,
    file_type: FileType,
    select_columns: &[String],
    filter_conditions: &[String],
) -> String {
    let projection = if select_columns.is_empty() {
        "*".to_string()
    } else {
        select_columns.join(", ")
    };
    let mut sql = format!(
        "SELECT {projection} FROM {}({})",
        file_type.table_function(),
        quote_literal(path)
    );
    if !filter_conditions.is_empty() {
        let conditions = filter_conditions
            .iter()
            .map(|condition| format!("({condition})"))
            .collect::<Vec<_>>()
            .join(" AND ");
        sql.push_str(" WHERE ");
        sql.push_str(&conditions);
    }
    sql
}

/// Unique name for a temporary relation holding a staged dataset.
pub fn staging_table_name() -> String {
    format!("ducklet_stage_{}", Uuid::new_v4().simple())
}

pub fn create_staging_table(name: &str, columns: &[(String, String)]) -> String {
    let defs = columns
        .iter()
        .map(|(column, sql_type)| format!("{} {sql_type}", quote_ident(column)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TEMPORARY TABLE {name} ({defs})")
}

/// Insert one row; each expression carries one `?` parameter.
pub fn insert_values(table: &str, expressions: &[String]) -> String {
    format!("INSERT INTO {table} VALUES ({})", expressions.join(", "))
}

pub fn create_table_as(table: &str, source: &str) -> String {
    format!("CREATE TABLE {table} AS SELECT * FROM {source}")
}

pub fn drop_table_if_exists(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {table}")
}

/// Copy a whole relation to a Parquet file.
pub fn copy_relation_to_parquet(relation: &str, destination: &str) -> String {
    format!(
        "COPY {relation} TO {} (FORMAT PARQUET)",
        quote_literal(destination)
    )
}

/// Copy the result of `SELECT * FROM table` to a Parquet file.
pub fn copy_table_to_parquet(table: &str, destination: &str) -> String {
    format!(
        "COPY (SELECT * FROM {table}) TO {} (FORMAT PARQUET)",
        quote_literal(destination)
    )
}

pub fn set_option(key: &str, value: &str) -> String {
    format!("SET {key} = {}", quote_literal(value))
}

pub fn install_and_load(extension: &str) -> String {
    format!("INSTALL {extension}; LOAD {extension};")
}
