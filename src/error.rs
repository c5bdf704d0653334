use thiserror::Error;

#[derive(Debug, Error)]
pub enum FacadeError {
    /// No open connection, or the engine could not be opened.
    #[error("connection error: {0}")]
    Connectivity(String),
    #[error("credential error: {0}")]
    Credential(String),
    /// DuckDB rejected the statement; the engine message is kept as-is.
    #[error("query error: {0}")]
    Query(#[source] duckdb::Error),
    #[error("execution error: {0}")]
    Execution(String),
    #[error("validation error: {0}")]
    Validation(String),
}

pub type Result<T, E = FacadeError> = std::result::Result<T, E>;

impl FacadeError {
    /// Short tag used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FacadeError::Connectivity(_) => "connectivity",
            FacadeError::Credential(_) => "credential",
            FacadeError::Query(_) => "query",
            FacadeError::Execution(_) => "execution",
            FacadeError::Validation(_) => "validation",
        }
    }

    pub(crate) fn not_connected(operation: &str) -> Self {
        FacadeError::Connectivity(format!(
            "DuckDB connection not established; call connect() before {operation}"
        ))
    }
}

impl From<duckdb::Error> for FacadeError {
    fn from(err: duckdb::Error) -> Self {
        match err {
            duckdb::Error::DuckDBFailure(..) => FacadeError::Query(err),
            other => FacadeError::Execution(other.to_string()),
        }
    }
}

impl From<arrow_schema::ArrowError> for FacadeError {
    fn from(err: arrow_schema::ArrowError) -> Self {
        FacadeError::Execution(format!("arrow error: {err}"))
    }
}
