mod common;

use anyhow::{ensure, Result};
use ducklet::{ConnectionFacade, FacadeError, ReadOptions, Value};

use common::{captured_facade, row};

#[test]
fn operations_before_connect_are_connectivity_errors() -> Result<()> {
    let (mut facade, logs) = captured_facade();

    let err = facade.execute_query("SELECT 1").unwrap_err();
    ensure!(matches!(err, FacadeError::Connectivity(_)), "got {err:?}");
    ensure!(err.to_string().contains("execute_query"));

    ensure!(matches!(
        facade.execute_query_streaming("SELECT 1").err(),
        Some(FacadeError::Connectivity(_))
    ));
    ensure!(matches!(
        facade.read_file("data.csv", "csv", &ReadOptions::new()),
        Err(FacadeError::Connectivity(_))
    ));
    ensure!(matches!(
        facade.create_table("t", &[row(vec![("id", Value::Int(1))])]),
        Err(FacadeError::Connectivity(_))
    ));
    ensure!(matches!(
        facade.save_table_as_file("t", std::env::temp_dir(), "t"),
        Err(FacadeError::Connectivity(_))
    ));
    ensure!(matches!(
        facade.enable_remote_storage(),
        Err(FacadeError::Connectivity(_))
    ));

    ensure!(!facade.is_connected());
    ensure!(logs.contents().contains("no open connection"));
    Ok(())
}

#[test]
fn scope_closes_the_connection_when_the_body_fails() -> Result<()> {
    let mut facade = ConnectionFacade::in_memory();

    let outcome: ducklet::Result<()> = facade.with_connection(|facade| {
        facade.execute_query("CREATE TABLE scoped (id INTEGER)")?;
        facade.execute_query("SELECT * FROM missing_table")?;
        Ok(())
    });

    ensure!(matches!(outcome, Err(FacadeError::Query(_))));
    ensure!(!facade.is_connected());
    facade.close()?;
    Ok(())
}

#[test]
fn scope_returns_the_body_value() -> Result<()> {
    let mut facade = ConnectionFacade::in_memory();
    let answer = facade.with_connection(|facade| {
        let result = facade.execute_query("SELECT 42 AS answer")?;
        Ok(result.first().and_then(|row| row.get("answer").cloned()))
    })?;
    ensure!(answer == Some(Value::Int(42)));
    ensure!(!facade.is_connected());
    Ok(())
}

#[test]
fn database_file_survives_reopening() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let db_file = dir.path().join("persist.duckdb");

    let mut facade = ConnectionFacade::with_db_file(&db_file);
    ensure!(facade.db_file() == Some(db_file.as_path()));
    facade.with_connection(|facade| {
        facade.execute_query("CREATE TABLE kept (id INTEGER, name VARCHAR)")?;
        facade.execute_query("INSERT INTO kept VALUES (1, 'one'), (2, 'two')")?;
        Ok(())
    })?;

    let mut reopened = ConnectionFacade::with_db_file(&db_file);
    reopened.connect()?;
    let result = reopened.execute_query("SELECT count(*) AS n FROM kept")?;
    ensure!(result.first().and_then(|row| row.get("n")) == Some(&Value::BigInt(2)));
    reopened.close()?;
    Ok(())
}

#[test]
fn unopenable_database_file_is_a_connectivity_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut facade = ConnectionFacade::with_db_file(dir.path().join("no/such/dir/db.duckdb"));
    let err = facade.connect().unwrap_err();
    ensure!(matches!(err, FacadeError::Connectivity(_)), "got {err:?}");
    ensure!(!facade.is_connected());
    Ok(())
}
