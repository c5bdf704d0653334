//! A thin facade over an embedded DuckDB connection.
//!
//! [`ConnectionFacade`] owns the connection lifecycle and exposes SQL
//! execution (eager or streaming), CSV/Parquet interchange and S3 access
//! backed by temporary cloud credentials.

pub mod config;
pub mod engine;
pub mod error;
pub mod facade;
pub mod interchange;
pub mod logging;
pub mod query;
pub mod remote;
pub mod sql;
pub mod types;

pub use config::FacadeConfig;
pub use duckdb::types::Value;
pub use error::{FacadeError, Result};
pub use facade::{ConnectionFacade, FacadeBuilder};
pub use interchange::{FileType, ReadOptions};
pub use query::{QueryParams, ResultSet, Row, RowStream};
#[cfg(feature = "aws")]
pub use remote::AwsIdentityProvider;
pub use remote::{
    CallerIdentity, CredentialSet, FrozenCredentials, IdentityProvider, NoIdentityProvider,
    StaticIdentityProvider,
};
