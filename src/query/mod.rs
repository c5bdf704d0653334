//! Query execution types.
//!
//! This module provides:
//! - `Row`: one result row, keyed by column name
//! - `ResultSet`: eagerly materialized rows sharing one column list
//! - `RowStream`: lazy, single-pass rows pulled from the engine cursor
//! - `QueryParams`: positional or named parameter binding

mod params;
mod row;
mod stream;

pub use params::QueryParams;
pub use row::{ResultSet, Row};
pub use stream::RowStream;
