//! DuckDB engine module - connection lifecycle and statement execution.
//!
//! This module provides:
//! - `EngineConnection`: owned duckdb::Connection opened from configuration
//!   against a database file or an in-memory instance

pub mod connection;

pub use connection::EngineConnection;
